//! portmon-monitor
//!
//! Interactive terminal front end: a full-screen feed of received lines
//! with single-key control of logging, graphing, and vertical zoom.
//!
//! Keys: `l` toggle logging, `g` toggle graphing, `+`/`-` zoom, `q` or
//! Esc to quit (saving the chart if one is running).

use portmon::chart::{ChartConfig, ViewRange};
use portmon::port::BaudRate;
use portmon::session::{Event, Session};
use portmon_tools::MonitorConfig;

use std::collections::VecDeque;
use std::env;
use std::io::{stdout, Stdout};
use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;

use futures::{future::FutureExt, select, StreamExt};
use futures_timer::Delay;

use crossterm::ExecutableCommand;
use crossterm::{
    cursor::*,
    event::{Event as TermEvent, EventStream, KeyCode},
    terminal::*,
};

const FEED_CAP: usize = 500;

fn drain_feed(events: &crossbeam::channel::Receiver<Event>, feed: &mut VecDeque<String>) {
    for event in events.try_iter() {
        feed.push_back(match event {
            Event::Line { stamp, text } => format!("[{}] {}", stamp, text),
            Event::Info(msg) => format!("[INFO] {}", msg),
            Event::Warn(msg) => format!("[WARN] {}", msg),
        });
    }
    while feed.len() > FEED_CAP {
        feed.pop_front();
    }
}

fn redraw(
    stdout: &mut Stdout,
    session: &Session,
    port_name: &str,
    baud: BaudRate,
    feed: &VecDeque<String>,
) {
    let (cols, rows) = size().unwrap_or((80, 24));
    let width = cols as usize;

    let link = if session.is_connected() {
        format!("{} @ {}", port_name, baud)
    } else {
        format!("{} (stream ended)", port_name)
    };
    let graph = match session.chart_view() {
        Some(view) => format!(
            "graph {} samples, y {:.1}..{:.1}",
            view.samples,
            view.range.y_min(),
            view.range.y_max()
        ),
        None => "graph off".to_string(),
    };
    let status = format!(
        "{} | log {} | {} | l log  g graph  +/- zoom  q quit",
        link,
        if session.is_logging() { "on" } else { "off" },
        graph,
    );
    let _ = stdout.execute(MoveTo(0, 0));
    let _ = stdout.execute(Clear(ClearType::CurrentLine));
    println!("\r{}", truncate(&status, width));

    let visible = rows.saturating_sub(2) as usize;
    let tail = feed.len().saturating_sub(visible);
    for (i, line) in feed.iter().skip(tail).enumerate() {
        let _ = stdout.execute(MoveTo(0, (i + 2) as u16));
        let _ = stdout.execute(Clear(ClearType::CurrentLine));
        println!("\r{}", truncate(line, width));
    }
}

fn truncate(line: &str, width: usize) -> &str {
    let end = line
        .char_indices()
        .nth(width)
        .map(|(i, _)| i)
        .unwrap_or(line.len());
    &line[..end]
}

fn toggle_logging(session: &mut Session, config: &MonitorConfig, feed: &mut VecDeque<String>) {
    if session.is_logging() {
        session.stop_logging();
    } else {
        let path = config.log_dir.join(portmon_tools::default_log_name());
        if let Err(e) = session.start_logging(&path) {
            feed.push_back(format!("[ERROR] failed to open {}: {}", path.display(), e));
        }
    }
}

async fn run_monitor(
    mut session: Session,
    config: MonitorConfig,
    port_name: String,
    baud: BaudRate,
) {
    let mut reader = EventStream::new();
    let events = session.events();
    let mut feed: VecDeque<String> = VecDeque::new();
    let mut stdout = stdout();

    'ui: loop {
        let mut delay = Delay::new(Duration::from_millis(200)).fuse();
        let mut event = reader.next().fuse();

        select! {
            _ = delay => {
                drain_feed(&events, &mut feed);
                redraw(&mut stdout, &session, &port_name, baud, &feed);
            },
            some_event = event => {
                match some_event {
                    Some(Ok(event)) => {
                        if event == TermEvent::Key(KeyCode::Char('q').into())
                            || event == TermEvent::Key(KeyCode::Esc.into())
                        {
                            break 'ui;
                        } else if event == TermEvent::Key(KeyCode::Char('l').into()) {
                            toggle_logging(&mut session, &config, &mut feed);
                        } else if event == TermEvent::Key(KeyCode::Char('g').into()) {
                            if session.is_graphing() {
                                session.stop_graph();
                            } else {
                                session.start_graph();
                            }
                        } else if event == TermEvent::Key(KeyCode::Char('+').into())
                            || event == TermEvent::Key(KeyCode::Char('=').into())
                        {
                            session.zoom_in();
                        } else if event == TermEvent::Key(KeyCode::Char('-').into()) {
                            session.zoom_out();
                        }
                    }
                    Some(Err(e)) => feed.push_back(format!("[ERROR] {}", e)),
                    None => break 'ui,
                }
            }
        }
    }

    if session.is_graphing() {
        session.stop_graph();
    }
    session.disconnect();
    drain_feed(&events, &mut feed);
    redraw(&mut stdout, &session, &port_name, baud, &feed);
}

fn main() -> ExitCode {
    let mut opts = portmon_tools::serial_opts();
    opts.optopt(
        "c",
        "config",
        "YAML config file (default ./portmon.yaml when present)",
        "path",
    );

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
            let usage = format!("Usage: {} -p port [-b rate] [-c config]  or {} --enum", &args[0], &args[0]);
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

    let config = match matches.opt_str("c") {
        Some(path) => match portmon_tools::load_config(Path::new(&path)) {
            Ok(cfg) => cfg,
            Err(msg) => die!("{}", msg),
        },
        None => {
            let default_path = Path::new("portmon.yaml");
            if default_path.exists() {
                match portmon_tools::load_config(default_path) {
                    Ok(cfg) => cfg,
                    Err(msg) => die!("{}", msg),
                }
            } else {
                MonitorConfig::default()
            }
        }
    };
    if config.y_max <= config.y_min {
        die!("config y range {}..{} is empty", config.y_min, config.y_max);
    }

    let port_name = match matches.opt_str("p").or_else(|| config.port.clone()) {
        Some(p) => p,
        None => die_usage!("no port specified"),
    };
    let baud = match portmon_tools::parse_baud(&matches) {
        Ok(Some(b)) => b,
        Ok(None) => match BaudRate::try_from(config.baud) {
            Ok(b) => b,
            Err(bps) => die!("unsupported baud rate {} in config", bps),
        },
        Err(msg) => die_usage!("{}", msg),
    };

    let mut session = Session::new(ChartConfig {
        view: ViewRange::new(config.y_min, config.y_max),
        out_dir: config.chart_dir.clone(),
        ..ChartConfig::default()
    });
    if let Err(e) = session.connect(&port_name, baud) {
        die!("{}", e);
    }

    let mut stdout = stdout();

    if let Err(e) = enable_raw_mode() {
        die!("terminal setup failed: {}", e);
    }
    let _ = stdout.execute(EnterAlternateScreen);
    let _ = stdout.execute(Clear(ClearType::All));
    let _ = stdout.execute(Hide);

    async_std::task::block_on(run_monitor(session, config, port_name, baud));

    let _ = stdout.execute(LeaveAlternateScreen);
    let _ = stdout.execute(Show);
    let _ = disable_raw_mode();

    ExitCode::SUCCESS
}
