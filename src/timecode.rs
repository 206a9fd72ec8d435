use thiserror::Error;

/// Failure to interpret an elapsed-time string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported time code: '{0}'")]
pub struct TimecodeError(pub String);

/// Parse an elapsed-time string into seconds.
///
/// Accepts `SS[.ss]`, `MM:SS[.ss]`, and `HH:MM:SS[.ss]`. Hour and minute
/// tokens must be whole numbers; the seconds token may carry a fraction.
/// Any other token count, or a token that fails numeric conversion, is an
/// error carrying the offending string.
pub fn parse_timecode(code: &str) -> Result<f64, TimecodeError> {
    let fail = || TimecodeError(code.to_string());
    let parts: Vec<&str> = code.split(':').collect();

    match parts.as_slice() {
        [s] => s.trim().parse::<f64>().map_err(|_| fail()),
        [m, s] => {
            let m: i64 = m.trim().parse().map_err(|_| fail())?;
            let s: f64 = s.trim().parse().map_err(|_| fail())?;
            Ok(m as f64 * 60.0 + s)
        }
        [h, m, s] => {
            let h: i64 = h.trim().parse().map_err(|_| fail())?;
            let m: i64 = m.trim().parse().map_err(|_| fail())?;
            let s: f64 = s.trim().parse().map_err(|_| fail())?;
            Ok(h as f64 * 3600.0 + m as f64 * 60.0 + s)
        }
        _ => Err(fail()),
    }
}
