//! Tokenizer for single annotation lines.
//!
//! Each recognized line becomes one [`Directive`]. The positional ` - `
//! separated layout of the annotation language is taken apart here, so the
//! annotation parser only deals with typed values.

use crate::brackets::{angle_reference, between_brackets, json_fragment, split_list, strip_tokens};
use crate::example_resolver::FilterSpec;
use crate::extractor::ParameterLocation;
use log::{debug, error, warn};

/// Filter tokens that may trail a schema reference.
const FILTER_TOKENS: &[&str] = &["with", "exclude", "only", "append"];

/// Body of a `@responseBody` or `@requestBody` line.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// `<User>` or `<User[]>`, with its filter tokens
    Reference { reference: String, filter: FilterSpec },
    /// Raw text of a `{...}` fragment, not yet parsed
    Json(String),
    None,
}

/// Second part of a `@responseHeader` line.
#[derive(Debug, Clone, PartialEq)]
pub enum HeaderDirective {
    /// `@use(group, ...)`
    Use(Vec<String>),
    Single {
        name: String,
        description: String,
        /// Everything after the description, e.g. `@type(integer) @example(5)`
        meta: String,
    },
}

/// Hints trailing a `@param*` line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamMeta {
    pub required: bool,
    pub type_name: Option<String>,
    pub example: Option<String>,
    pub enum_values: Vec<String>,
}

/// One parsed annotation line.
#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
    Summary(String),
    Description(String),
    OperationId(String),
    Tag(String),
    ResponseBody {
        status: String,
        description: String,
        payload: Payload,
    },
    ResponseHeader {
        status: String,
        header: HeaderDirective,
    },
    RequestBody(Payload),
    RequestFormDataBody(Payload),
    Param {
        location: ParameterLocation,
        name: String,
        description: Option<String>,
        meta: ParamMeta,
    },
    ParamUse(Vec<String>),
}

impl Directive {
    /// Tokenizes one trimmed annotation line.
    ///
    /// Lines that are not directives, or directives missing a mandatory part,
    /// yield `None`.
    pub fn parse(line: &str) -> Option<Directive> {
        let line = line.trim();
        if !line.starts_with('@') {
            return None;
        }

        let keyword_end = line[1..]
            .find(|c: char| !c.is_alphanumeric() && c != '_')
            .map_or(line.len(), |i| i + 1);
        let keyword = &line[..keyword_end];
        let rest = line[keyword_end..].trim();

        match keyword {
            "@summary" => text(rest).map(Directive::Summary),
            "@description" => text(rest).map(Directive::Description),
            "@operationId" => text(rest).map(Directive::OperationId),
            "@tag" => text(rest).map(Directive::Tag),
            "@responseBody" => parse_response_body(rest),
            "@responseHeader" => parse_response_header(rest),
            "@requestBody" => Some(Directive::RequestBody(split_payload(rest).0)),
            "@requestFormDataBody" => Some(Directive::RequestFormDataBody(split_payload(rest).0)),
            "@paramPath" => parse_param(ParameterLocation::Path, rest),
            "@paramQuery" => parse_param(ParameterLocation::Query, rest),
            "@paramHeader" => parse_param(ParameterLocation::Header, rest),
            "@paramUse" => Some(Directive::ParamUse(split_list(&between_brackets(
                line, "paramUse",
            )))),
            _ => {
                debug!("Ignoring unknown annotation: {}", line);
                None
            }
        }
    }
}

fn text(rest: &str) -> Option<String> {
    (!rest.is_empty()).then(|| rest.to_string())
}

/// `<status> [-] [description] [<Ref>.filters | {json}]`
fn parse_response_body(rest: &str) -> Option<Directive> {
    let (status, remainder) = match rest.split_once(char::is_whitespace) {
        Some((status, remainder)) => (status, remainder),
        None => (rest, ""),
    };
    if status.is_empty() {
        warn!("@responseBody without a status code, skipping");
        return None;
    }

    let (payload, description) = split_payload(remainder);
    Some(Directive::ResponseBody {
        status: status.to_string(),
        description,
        payload,
    })
}

/// `<status> - <name> - <description> - <meta>` or `<status> - @use(groups)`
fn parse_response_header(rest: &str) -> Option<Directive> {
    let parts: Vec<&str> = rest.split(" - ").map(str::trim).collect();
    let status = parts.first().copied().unwrap_or_default();
    let name = parts.get(1).copied().unwrap_or_default();

    if status.is_empty() || status.contains(' ') || name.is_empty() {
        error!("@responseHeader needs a status and a name: {}", rest);
        return None;
    }

    let header = if name.starts_with("@use(") {
        HeaderDirective::Use(split_list(&between_brackets(name, "use")))
    } else {
        let description = parts
            .get(2)
            .filter(|part| !part.starts_with('@'))
            .map(|part| part.to_string())
            .unwrap_or_default();
        let meta_start = if description.is_empty() { 2 } else { 3 };
        HeaderDirective::Single {
            name: name.to_string(),
            description,
            meta: parts.get(meta_start..).unwrap_or_default().join(" - "),
        }
    };

    Some(Directive::ResponseHeader {
        status: status.to_string(),
        header,
    })
}

/// `<name> - <description> - <meta>`
fn parse_param(location: ParameterLocation, rest: &str) -> Option<Directive> {
    let parts: Vec<&str> = rest.split(" - ").map(str::trim).collect();
    let name = parts
        .first()
        .and_then(|part| part.split_whitespace().next())
        .unwrap_or_default();
    if name.is_empty() || name.starts_with('@') {
        warn!("Parameter annotation without a name: {}", rest);
        return None;
    }

    let description = parts
        .get(1)
        .filter(|part| !part.is_empty() && !part.starts_with('@'))
        .map(|part| part.to_string());

    let non_empty = |value: String| (!value.is_empty()).then_some(value);
    let meta = ParamMeta {
        required: rest.contains("@required"),
        type_name: non_empty(between_brackets(rest, "type")),
        example: non_empty(between_brackets(rest, "example")),
        enum_values: split_list(&between_brackets(rest, "enum")),
    };

    Some(Directive::Param {
        location,
        name: name.to_string(),
        description,
        meta,
    })
}

/// Separates the payload of a body line from its free-text description.
///
/// A `{` ahead of any `<` selects the JSON form, otherwise an angle bracket
/// selects the reference form.
pub fn split_payload(text: &str) -> (Payload, String) {
    let brace = text.find('{');
    let angle = text.find('<');

    let json_first = match (brace, angle) {
        (Some(brace), Some(angle)) => brace < angle,
        (Some(_), None) => true,
        _ => false,
    };

    if json_first {
        if let Some(fragment) = json_fragment(text) {
            let description = text.replacen(fragment, "", 1);
            return (Payload::Json(fragment.to_string()), clean_description(&description));
        }
    }

    if angle.is_some() {
        if let Some(reference) = angle_reference(text) {
            let payload = Payload::Reference {
                reference: reference.to_string(),
                filter: FilterSpec::from_line(text),
            };
            let description = remove_angle_section(&strip_tokens(text, FILTER_TOKENS));
            return (payload, clean_description(&description));
        }
    }

    (Payload::None, clean_description(text))
}

/// Drops the text from the first `<` to the last `>`.
fn remove_angle_section(text: &str) -> String {
    match (text.find('<'), text.rfind('>')) {
        (Some(start), Some(end)) if start < end => {
            format!("{}{}", &text[..start], &text[end + 1..])
        }
        _ => text.to_string(),
    }
}

/// Joins the non-empty ` - ` separated pieces of a description.
fn clean_description(text: &str) -> String {
    text.split(" - ")
        .map(|piece| piece.trim().trim_matches('-').trim())
        .filter(|piece| !piece.is_empty())
        .collect::<Vec<_>>()
        .join(" - ")
}
