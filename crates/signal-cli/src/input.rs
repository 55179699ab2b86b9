use analysis_core::Bar;
use chrono::Utc;

/// Parse `OPEN,HIGH,LOW,CLOSE` into a bar stamped now.
pub fn parse_bar(value: &str) -> Result<Bar, String> {
    let fields: Vec<f64> = value
        .split(',')
        .map(|f| {
            f.trim()
                .parse::<f64>()
                .map_err(|e| format!("'{}' is not a number: {}", f.trim(), e))
        })
        .collect::<Result<_, _>>()?;

    match fields.as_slice() {
        [open, high, low, close] => Ok(Bar::new(Utc::now(), *open, *high, *low, *close)),
        _ => Err(format!(
            "expected OPEN,HIGH,LOW,CLOSE but got {} values",
            fields.len()
        )),
    }
}
