pub mod print;


use crate::request::RequestDescriptor;
use crate::Response;
use anyhow::Result;

#[derive(Debug, Eq, PartialEq, Clone)]
pub enum FormatItem {
    FirstLine,
    Headers,
    Body,
    Chars(String),
}

pub fn parse_format(format: &str) -> Result<Vec<FormatItem>> {
    let mut result = Vec::new();
    let mut marker = false;
    let mut buff = String::new();
    for ch in format.chars() {
        if marker {
            marker = false;
            let action = match ch {
                '%' => None,
                'R' => Some(FormatItem::FirstLine),
                'H' => Some(FormatItem::Headers),
                'B' => Some(FormatItem::Body),
                _ => return Err(anyhow!("Invalid formatting character '{}'", ch)),
            };
            if let Some(a) = action {
                if !buff.is_empty() {
                    result.push(FormatItem::Chars(buff));
                    buff = String::new();
                }
                result.push(a);
            } else {
                buff.push(ch);
            }
        } else if ch == '%' {
            marker = true;
        } else {
            buff.push(ch);
        }
    }
    if !buff.is_empty() {
        result.push(FormatItem::Chars(buff));
    }
    Ok(result)
}

/// JSON objects are pretty printed, anything else is shown as is.
fn prettify_body(body: &str) -> String {
    match serde_json::from_str(body) {
        Ok(serde_json::Value::Object(object)) => {
            serde_json::to_string_pretty(&object).unwrap_or_else(|_| String::from(body))
        }
        _ => String::from(body),
    }
}

pub trait Outputter {
    fn request(&mut self, request: &RequestDescriptor) -> Result<()>;
    fn response(&mut self, response: &Response) -> Result<()>;
}
