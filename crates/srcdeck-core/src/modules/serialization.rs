use std::fs;
use std::path::Path;

/// Column after which an MCNP card line is continued.
pub const MCNP_LINE_WIDTH: usize = 72;
const MCNP_CONTINUATION: &str = "     ";
const FLUKA_FIELD_WIDTH: usize = 10;

/// C `%.<precision>g`: shortest of fixed/scientific with trailing zeros removed.
pub fn format_general(value: f64, precision: usize) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }

    let precision = precision.max(1);
    let scientific = format!("{:.*e}", precision - 1, value);
    let (mantissa, exponent) = scientific
        .split_once('e')
        .unwrap_or((scientific.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);

    if exponent < -4 || exponent >= precision as i32 {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!(
            "{}e{}{:02}",
            trim_fraction(mantissa),
            sign,
            exponent.unsigned_abs()
        )
    } else {
        let decimals = (precision as i32 - 1 - exponent).max(0) as usize;
        trim_fraction(&format!("{:.*}", decimals, value)).to_string()
    }
}

fn trim_fraction(text: &str) -> &str {
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.')
    } else {
        text
    }
}

/// Five significant digits; integral results keep a `.0` so the value reads
/// as floating point on the card.
pub fn format_double(value: f64) -> String {
    let text = format_general(value, 5);
    if text.contains(['.', 'e', 'n', 'i']) {
        text
    } else {
        text + ".0"
    }
}

pub fn format_doubles(values: &[f64]) -> String {
    values
        .iter()
        .map(|value| format_double(*value))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Wrap one logical MCNP card at token boundaries; continuation lines are
/// indented by five blanks.
pub fn write_mcnp_card(line: &str, out: &mut String) {
    let mut current = String::new();
    let mut has_token = false;
    for token in line.split_whitespace() {
        if has_token && current.len() + 1 + token.len() > MCNP_LINE_WIDTH {
            out.push_str(&current);
            out.push('\n');
            current = MCNP_CONTINUATION.to_string();
            has_token = false;
        }
        if has_token {
            current.push(' ');
        }
        current.push_str(token);
        has_token = true;
    }
    if has_token {
        out.push_str(&current);
        out.push('\n');
    }
}

/// `  name = value   # comment` line of a PHITS section.
pub fn phits_line(name: &str, value: &str, comment: &str) -> String {
    let body = format!("  {:<9}= {}", name, value);
    if comment.is_empty() {
        body
    } else {
        format!("{:<36}# {}", body, comment)
    }
}

pub fn phits_double(name: &str, value: f64, comment: &str) -> String {
    phits_line(name, &format_general(value, 6), comment)
}

/// Right-aligned FLUKA WHAT field that always fits ten columns.
pub fn format_fluka_field(value: f64) -> String {
    let mut text = format_general(value, 8);
    let mut precision = 8;
    while text.len() > FLUKA_FIELD_WIDTH && precision > 1 {
        precision -= 1;
        text = format_general(value, precision);
    }
    if !text.contains(['.', 'e']) {
        text.push('.');
    }
    format!("{:>width$}", text, width = FLUKA_FIELD_WIDTH)
}

/// Fixed-format FLUKA card: keyword, six WHAT fields, SDUM. Empty WHATs are
/// left blank.
pub fn fluka_card(keyword: &str, whats: [Option<f64>; 6], sdum: &str) -> String {
    let mut line = format!("{:<width$}", keyword, width = FLUKA_FIELD_WIDTH);
    for what in whats {
        match what {
            Some(value) => line.push_str(&format_fluka_field(value)),
            None => line.push_str(&" ".repeat(FLUKA_FIELD_WIDTH)),
        }
    }
    line.push_str(sdum);
    line.trim_end().to_string()
}

pub fn normalize_text_artifact(content: &str) -> String {
    let mut normalized = content.replace("\r\n", "\n").replace('\r', "\n");
    if !normalized.is_empty() && !normalized.ends_with('\n') {
        normalized.push('\n');
    }
    normalized
}

pub fn write_text_artifact(path: &Path, content: &str) -> std::io::Result<()> {
    fs::write(path, normalize_text_artifact(content))
}
