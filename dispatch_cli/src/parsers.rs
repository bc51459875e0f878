use std::ops::RangeInclusive;

use jiff::SpanRelativeTo;

pub fn parse_duration(input: &str) -> Result<jiff::SignedDuration, String> {
    if let Ok(duration) = input.parse::<jiff::SignedDuration>() {
        return Ok(duration);
    }

    if let Ok(duration) = input
        .parse::<jiff::Span>()
        .and_then(|span| span.to_duration(SpanRelativeTo::days_are_24_hours()))
    {
        return Ok(duration);
    }

    if let Ok(seconds) = input.parse::<i64>() {
        return Ok(jiff::SignedDuration::from_secs(seconds.abs()));
    }

    Err(String::from("Invalid duration"))
}

/// Accepts `a..=b`, `a..b`, `a-b` or a single value.
pub fn parse_capacity_range(input: &str) -> Result<RangeInclusive<u32>, String> {
    let parse = |value: &str| {
        value
            .trim()
            .parse::<u32>()
            .map_err(|_| format!("Invalid capacity `{value}`"))
    };

    let range = if let Some((start, end)) = input.split_once("..=") {
        parse(start)?..=parse(end)?
    } else if let Some((start, end)) = input.split_once("..") {
        let end = parse(end)?;
        if end == 0 {
            return Err(String::from("Empty capacity range"));
        }
        parse(start)?..=end - 1
    } else if let Some((start, end)) = input.split_once('-') {
        parse(start)?..=parse(end)?
    } else {
        let value = parse(input)?;
        value..=value
    };

    if range.is_empty() {
        return Err(String::from("Empty capacity range"));
    }

    Ok(range)
}
