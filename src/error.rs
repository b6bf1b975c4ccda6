use anyhow::anyhow;
use reqwest::StatusCode;

/// Error payload produced by the DataMall API gateway, e.g.
/// `{"fault":{"faultstring":"Invalid Account Key","detail":{"errorcode":"oauth.v2.InvalidApiKey"}}}`.
#[derive(Debug, serde::Deserialize)]
pub(crate) struct ApiFaultResponse {
    pub(crate) fault: ApiFault,
}

#[derive(Debug, serde::Deserialize)]
pub(crate) struct ApiFault {
    #[serde(default)]
    pub(crate) faultstring: Option<String>,
    #[serde(default)]
    pub(crate) detail: Option<ApiFaultDetail>,
}

#[derive(Debug, serde::Deserialize)]
pub(crate) struct ApiFaultDetail {
    #[serde(default)]
    pub(crate) errorcode: Option<String>,
}

pub(crate) fn format_api_error(
    status: StatusCode,
    url: &str,
    e: &ApiFaultResponse,
) -> anyhow::Error {
    let faultstring = e.fault.faultstring.as_deref().unwrap_or("");
    let errorcode = e
        .fault
        .detail
        .as_ref()
        .and_then(|d| d.errorcode.as_deref())
        .unwrap_or("");

    // A rejected account key is by far the most common failure; spell out
    // the remediation.
    let looks_like_bad_key = status == StatusCode::UNAUTHORIZED
        || status == StatusCode::FORBIDDEN
        || errorcode.contains("InvalidApiKey");
    if looks_like_bad_key {
        return anyhow!(
            "DataMall rejected the account key (HTTP {}).\n- Check that DATAMALL_API_KEY (or the `key:` line of .datamallrc) holds the key exactly as issued\n- Keys are free: https://datamall.lta.gov.sg/content/datamall/en/request-for-api.html\n\nServer message: {}\nerrorcode: {}\nrequest: {}",
            status.as_u16(),
            faultstring,
            if errorcode.is_empty() {
                "(none)"
            } else {
                errorcode
            },
            url
        );
    }

    if status == StatusCode::TOO_MANY_REQUESTS || errorcode.contains("SpikeArrest") {
        return anyhow!(
            "DataMall rate limit hit (HTTP {}). Wait a moment and re-run.\n\nServer message: {}\nrequest: {}",
            status.as_u16(),
            faultstring,
            url
        );
    }

    anyhow!(
        "API request failed: HTTP {} for url ({})\n{}",
        status.as_u16(),
        url,
        faultstring
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fault(faultstring: &str, errorcode: &str) -> ApiFaultResponse {
        serde_json::from_str(&format!(
            r#"{{"fault":{{"faultstring":"{}","detail":{{"errorcode":"{}"}}}}}}"#,
            faultstring, errorcode
        ))
        .unwrap()
    }

    #[test]
    fn invalid_key_points_at_env_var() {
        let err = format_api_error(
            StatusCode::UNAUTHORIZED,
            "http://example.invalid/Taxi-Availability",
            &fault("Invalid Account Key", "oauth.v2.InvalidApiKey"),
        );

        let msg = err.to_string();
        assert!(msg.contains("DATAMALL_API_KEY"));
        assert!(msg.contains("Invalid Account Key"));
        assert!(msg.contains("HTTP 401"));
    }

    #[test]
    fn spike_arrest_reported_as_rate_limit() {
        let err = format_api_error(
            StatusCode::TOO_MANY_REQUESTS,
            "http://example.invalid/Taxi-Availability",
            &fault("Spike arrest violation", "policies.ratelimit.SpikeArrestViolation"),
        );

        assert!(err.to_string().contains("rate limit"));
    }

    #[test]
    fn other_faults_fall_back_to_generic_message() {
        let err = format_api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "http://example.invalid/Taxi-Availability",
            &fault("Internal error", "messaging.adaptors.http.flow.ServiceUnavailable"),
        );

        let msg = err.to_string();
        assert!(msg.contains("API request failed: HTTP 500"));
        assert!(msg.contains("Internal error"));
    }

    #[test]
    fn fault_without_detail_still_parses() {
        let e: ApiFaultResponse =
            serde_json::from_str(r#"{"fault":{"faultstring":"boom"}}"#).unwrap();
        assert_eq!(e.fault.faultstring.as_deref(), Some("boom"));
        assert!(e.fault.detail.is_none());
    }
}
