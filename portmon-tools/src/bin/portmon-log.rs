//! portmon-log
//!
//! Streams timestamped lines from a serial device to stdout, optionally
//! mirroring them into a log file, and optionally graphing classified
//! samples for a fixed window before saving the chart image.

use crossbeam::channel::RecvTimeoutError;
use portmon::chart::ChartConfig;
use portmon::port::BaudRate;
use portmon::session::{Event, Session};
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

fn print_event(event: Event) {
    match event {
        Event::Line { stamp, text } => println!("[{}] {}", stamp, text),
        Event::Info(msg) => println!("[INFO] {}", msg),
        Event::Warn(msg) => println!("[WARN] {}", msg),
    }
}

fn main() -> ExitCode {
    let mut opts = portmon_tools::serial_opts();
    opts.optopt("f", "file", "mirror lines into this log file", "path");
    opts.optopt(
        "g",
        "graph",
        "graph classified samples for this many seconds, then save a chart image",
        "seconds",
    );
    opts.optopt("o", "", "directory for the chart image (default .)", "dir");

    let args: Vec<String> = env::args().collect();

    macro_rules! die{
        ($f:expr,$($a:tt)*)=>{
        {
            die!(format!($f, $($a)*));
        }
        };
        ($msg:expr)=>{
        {
            eprintln!("ERROR: {}", $msg);
            return ExitCode::FAILURE;
        }
        };
    }
    macro_rules! die_usage{
        ($f:expr,$($a:tt)*)=>{
        {
            die_usage!(format!($f, $($a)*));
        }
        };
        ($msg:expr)=>{
        {
            let usage = format!("Usage: {} -p port [-b rate] [-f path] [-g seconds]  or {} --enum", &args[0], &args[0]);
            die!("{}\n{}", $msg, opts.usage(&usage));
        }
        };
    }

    let matches = match opts.parse(&args[1..]) {
        Ok(m) => m,
        Err(f) => die_usage!("{}", f.to_string()),
    };

    if matches.opt_present("enum") {
        portmon_tools::print_ports();
        return ExitCode::SUCCESS;
    }

    let port_name = match matches.opt_str("p") {
        Some(p) => p,
        None => die_usage!("no port specified"),
    };
    let baud = match portmon_tools::parse_baud(&matches) {
        Ok(b) => b.unwrap_or(BaudRate::B115200),
        Err(msg) => die_usage!("{}", msg),
    };
    let graph_window = match matches.opt_str("g") {
        Some(raw) => match raw.parse::<u64>() {
            Ok(secs) => Some(Duration::from_secs(secs)),
            Err(_) => die_usage!("invalid graph window '{}'", raw),
        },
        None => None,
    };
    let out_dir = PathBuf::from(matches.opt_str("o").unwrap_or(".".to_string()));

    let mut session = Session::new(ChartConfig {
        out_dir,
        ..ChartConfig::default()
    });
    let events = session.events();

    if let Err(e) = session.connect(&port_name, baud) {
        die!("{}", e);
    }
    if let Some(path) = matches.opt_str("f") {
        if let Err(e) = session.start_logging(&path) {
            die!("failed to open {}: {}", path, e);
        }
    }
    let graph_deadline = graph_window.map(|window| {
        session.start_graph();
        Instant::now() + window
    });

    loop {
        if let Some(deadline) = graph_deadline {
            if session.is_graphing() && Instant::now() >= deadline {
                session.stop_graph();
            }
        }
        match events.recv_timeout(Duration::from_millis(200)) {
            Ok(event) => print_event(event),
            Err(RecvTimeoutError::Timeout) => {
                if !session.is_connected() {
                    break;
                }
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    if session.is_graphing() {
        session.stop_graph();
    }
    for event in events.try_iter() {
        print_event(event);
    }
    println!("[INFO] Stream ended");
    ExitCode::SUCCESS
}
