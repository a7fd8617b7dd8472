use crate::action_type::{ActionKind, SupportKind};
use crate::context::ResolveContext;
use crate::mapper::{
    decode_pairs, encode_pairs, read_bool, read_int, read_string, read_url, write_slot, KeyValue,
    ParameterMapper,
};
use companion_core::{ArgSlot, ArgValue, GenericAction};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const HTTP_REQUEST_CODE: i64 = 339;
pub const HTTP_REQUEST_NAME: &str = "HTTP Request";

// Slot ids as assigned by the server
pub(crate) const METHOD_SLOT: i64 = 1;
pub(crate) const URL_SLOT: i64 = 2;
pub(crate) const HEADERS_SLOT: i64 = 3;
pub(crate) const QUERY_SLOT: i64 = 4;
pub(crate) const BODY_SLOT: i64 = 5;
pub(crate) const TIMEOUT_SLOT: i64 = 8;
pub(crate) const TRUST_SLOT: i64 = 9;
pub(crate) const FOLLOW_REDIRECTS_SLOT: i64 = 10;
pub(crate) const USE_COOKIES_SLOT: i64 = 11;
pub(crate) const STRUCTURE_OUTPUT_SLOT: i64 = 12;

/// Request method; stored in the method slot as its index in Tasker's list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Head,
    Put,
    Patch,
    Delete,
    Options,
    Trace,
}

impl HttpMethod {
    const ALL: [HttpMethod; 8] = [
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Head,
        HttpMethod::Put,
        HttpMethod::Patch,
        HttpMethod::Delete,
        HttpMethod::Options,
        HttpMethod::Trace,
    ];

    pub fn index(self) -> i64 {
        Self::ALL.iter().position(|m| *m == self).unwrap_or(0) as i64
    }

    pub fn from_index(index: i64) -> Option<Self> {
        usize::try_from(index).ok().and_then(|i| Self::ALL.get(i).copied())
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Head => "HEAD",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Trace => "TRACE",
        }
    }

    /// Accepts either the list index or the method name
    fn from_slot(value: &ArgValue) -> Self {
        match value {
            ArgValue::Str(s) => s
                .parse()
                .ok()
                .or_else(|| s.trim().parse::<i64>().ok().and_then(Self::from_index))
                .unwrap_or_default(),
            other => other.as_int().and_then(Self::from_index).unwrap_or_default(),
        }
    }
}

impl FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|m| m.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown HTTP method '{}'", s))
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HttpRequestParams {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<KeyValue>,
    pub query_parameters: Vec<KeyValue>,
    pub body: String,
    pub timeout: i64,
    pub trust_any_certificate: bool,
    pub follow_redirects: bool,
    pub use_cookies: bool,
    pub structure_output: bool,
}

impl HttpRequestParams {
    /// A blank HTTP Request action with every slot present
    pub fn new_action() -> GenericAction {
        new_http_action()
    }
}

impl ParameterMapper for HttpRequestParams {
    fn decode(action: &GenericAction, _ctx: &ResolveContext) -> Self {
        Self {
            method: action
                .slot(METHOD_SLOT)
                .map(|slot| HttpMethod::from_slot(&slot.value))
                .unwrap_or_default(),
            url: read_url(action, URL_SLOT),
            headers: decode_pairs(&read_string(action, HEADERS_SLOT)),
            query_parameters: decode_pairs(&read_string(action, QUERY_SLOT)),
            body: read_string(action, BODY_SLOT),
            timeout: read_int(action, TIMEOUT_SLOT),
            trust_any_certificate: read_bool(action, TRUST_SLOT),
            follow_redirects: read_bool(action, FOLLOW_REDIRECTS_SLOT),
            use_cookies: read_bool(action, USE_COOKIES_SLOT),
            structure_output: read_bool(action, STRUCTURE_OUTPUT_SLOT),
        }
    }

    fn encode(&mut self, action: &mut GenericAction, _ctx: &ResolveContext) {
        // drop incomplete rows so the edited params match what was written
        self.headers.retain(KeyValue::is_complete);
        self.query_parameters.retain(KeyValue::is_complete);

        write_slot(action, METHOD_SLOT, self.method.index());
        write_slot(action, URL_SLOT, self.url.as_str());
        write_slot(action, HEADERS_SLOT, encode_pairs(&self.headers));
        write_slot(action, QUERY_SLOT, encode_pairs(&self.query_parameters));
        write_slot(action, BODY_SLOT, self.body.as_str());
        write_slot(action, TIMEOUT_SLOT, self.timeout);
        write_slot(action, TRUST_SLOT, self.trust_any_certificate);
        write_slot(action, FOLLOW_REDIRECTS_SLOT, self.follow_redirects);
        write_slot(action, USE_COOKIES_SLOT, self.use_cookies);
        write_slot(action, STRUCTURE_OUTPUT_SLOT, self.structure_output);
    }
}

impl ActionKind for HttpRequestParams {
    const ID: &'static str = "http_request";
    const NAME: &'static str = "HTTP Request";
    const SUPPORT: SupportKind = SupportKind::Custom;

    fn recognizes(&self, action: &GenericAction, _ctx: &ResolveContext) -> bool {
        action.is(HTTP_REQUEST_CODE, HTTP_REQUEST_NAME)
    }

    fn describe(&self) -> String {
        if self.url.is_empty() {
            self.method.to_string()
        } else {
            format!("{} {}", self.method, self.url)
        }
    }

    fn template() -> Option<GenericAction> {
        Some(new_http_action())
    }
}

pub(crate) fn new_http_action() -> GenericAction {
    GenericAction::new(HTTP_REQUEST_CODE, HTTP_REQUEST_NAME).with_args(vec![
        ArgSlot::new(METHOD_SLOT, "Method", HttpMethod::Get.index()),
        ArgSlot::new(URL_SLOT, "URL", ""),
        ArgSlot::new(HEADERS_SLOT, "Headers", ""),
        ArgSlot::new(QUERY_SLOT, "Query Parameters", ""),
        ArgSlot::new(BODY_SLOT, "Body", ""),
        ArgSlot::new(6, "File", ""),
        ArgSlot::new(7, "Output File", ""),
        ArgSlot::new(TIMEOUT_SLOT, "Timeout", 5),
        ArgSlot::new(TRUST_SLOT, "Trust Any Certificate", false),
        ArgSlot::new(FOLLOW_REDIRECTS_SLOT, "Follow Redirects", true),
        ArgSlot::new(USE_COOKIES_SLOT, "Use Cookies", true),
        ArgSlot::new(STRUCTURE_OUTPUT_SLOT, "Structure Output", true),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> ResolveContext {
        ResolveContext::default()
    }

    fn server_action() -> GenericAction {
        let mut action = new_http_action();
        write_slot(&mut action, METHOD_SLOT, 1);
        write_slot(&mut action, URL_SLOT, "http://example.com/hook");
        write_slot(&mut action, HEADERS_SLOT, "A:1\nB:2");
        write_slot(&mut action, BODY_SLOT, "{\"x\":1}");
        action
    }

    #[test]
    fn test_decode_slots_by_id() {
        let params = HttpRequestParams::decode(&server_action(), &ctx());
        assert_eq!(params.method, HttpMethod::Post);
        assert_eq!(params.url, "http://example.com/hook");
        assert_eq!(params.headers, vec![KeyValue::new("A", "1"), KeyValue::new("B", "2")]);
        assert!(params.query_parameters.is_empty());
        assert_eq!(params.timeout, 5);
        assert!(!params.trust_any_certificate);
        assert!(params.follow_redirects);
    }

    #[test]
    fn test_decode_ignores_slot_order() {
        let mut action = server_action();
        action.args.reverse();
        let reversed = HttpRequestParams::decode(&action, &ctx());
        assert_eq!(reversed, HttpRequestParams::decode(&server_action(), &ctx()));
    }

    #[test]
    fn test_zero_url_decodes_empty() {
        let mut action = new_http_action();
        write_slot(&mut action, URL_SLOT, 0);
        let params = HttpRequestParams::decode(&action, &ctx());
        assert_eq!(params.url, "");
    }

    #[test]
    fn test_method_accepts_name_or_index() {
        assert_eq!(HttpMethod::from_slot(&ArgValue::Int(3)), HttpMethod::Put);
        assert_eq!(HttpMethod::from_slot(&"delete".into()), HttpMethod::Delete);
        assert_eq!(HttpMethod::from_slot(&"5".into()), HttpMethod::Delete);
        assert_eq!(HttpMethod::from_slot(&ArgValue::Int(99)), HttpMethod::Get);
        assert_eq!(HttpMethod::from_slot(&ArgValue::Null), HttpMethod::Get);
    }

    #[test]
    fn test_encode_then_decode_is_stable() {
        let mut params = HttpRequestParams::decode(&server_action(), &ctx());
        params.method = HttpMethod::Patch;
        params.query_parameters = vec![KeyValue::new("q", "1"), KeyValue::new("", "dropped")];
        params.structure_output = false;

        let mut action = server_action();
        params.encode(&mut action, &ctx());

        assert_eq!(action.slot(METHOD_SLOT).unwrap().value, ArgValue::Int(4));
        assert_eq!(action.slot(HEADERS_SLOT).unwrap().value.to_string(), "A:1\nB:2\n");
        assert_eq!(HttpRequestParams::decode(&action, &ctx()), params);
    }

    #[test]
    fn test_header_decoding_is_idempotent() {
        let first = decode_pairs("A:1\n\nB:2\nbroken\n");
        let p2 = decode_pairs(&encode_pairs(&decode_pairs(&encode_pairs(&first))));
        let p3 = decode_pairs(&encode_pairs(&p2));
        assert_eq!(p2, p3);
    }
}
