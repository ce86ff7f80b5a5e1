use crate::output::{prettify_body, FormatItem, Outputter};
use crate::request::{Headers, RequestDescriptor};
use crate::Response;
use anyhow::Result;
use std::io::Write;

pub struct FormattedOutputter<'a, W: Write> {
    writer: &'a mut W,
    request_format: Vec<FormatItem>,
    response_format: Vec<FormatItem>,
}

impl<'a, W: Write> FormattedOutputter<'a, W> {
    pub fn new(
        writer: &'a mut W,
        request_format: Vec<FormatItem>,
        response_format: Vec<FormatItem>,
    ) -> FormattedOutputter<'a, W> {
        FormattedOutputter {
            writer,
            request_format,
            response_format,
        }
    }
}

fn format_headers(headers: &Headers) -> String {
    headers
        .iter()
        .map(|(key, value)| format!("{}: {}\n", key, value))
        .collect()
}

fn format_body(body: &[u8]) -> String {
    prettify_body(&String::from_utf8_lossy(body))
}

impl<'a, W: Write> Outputter for FormattedOutputter<'a, W> {
    fn request(&mut self, request: &RequestDescriptor) -> Result<()> {
        let RequestDescriptor {
            method,
            url,
            headers,
            body,
            ..
        } = request;

        for format_item in &self.request_format {
            let to_write = match format_item {
                FormatItem::FirstLine => format!("{} {}", method, url),
                FormatItem::Headers => format_headers(headers),
                FormatItem::Body => format_body(body),
                FormatItem::Chars(s) => s.clone(),
            };

            self.writer.write_all(to_write.as_bytes())?;
        }
        Ok(())
    }

    fn response(&mut self, response: &Response) -> Result<()> {
        let Response {
            code,
            headers,
            body,
        } = response;

        for format_item in &self.response_format {
            let to_write = match format_item {
                FormatItem::FirstLine => format!("HTTP {}", code),
                FormatItem::Headers => format_headers(headers),
                FormatItem::Body => format_body(body),
                FormatItem::Chars(s) => s.clone(),
            };

            self.writer.write_all(to_write.as_bytes())?;
        }
        Ok(())
    }
}
