//! API URL construction.

use factiva_types::Endpoint;

/// Returns the URL jobs for `endpoint` are submitted to.
///
/// # Example
///
/// ```
/// use factiva_fetch::url::job_url;
/// use factiva_types::Endpoint;
///
/// assert_eq!(
///     job_url("https://api.dowjones.com", Endpoint::TimeSeries),
///     "https://api.dowjones.com/analytics"
/// );
/// ```
#[must_use]
pub fn job_url(host: &str, endpoint: Endpoint) -> String {
    format!("{}{}", host.trim_end_matches('/'), endpoint.path())
}

/// Returns the status URL of `job_id` on `endpoint`.
///
/// Extraction and explain ids may be path-like; they are appended as-is.
#[must_use]
pub fn status_url(host: &str, endpoint: Endpoint, job_id: &str) -> String {
    format!("{}/{}", job_url(host, endpoint), job_id.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_url_per_endpoint() {
        let host = "https://api.dowjones.com/";
        assert_eq!(
            job_url(host, Endpoint::Explain),
            "https://api.dowjones.com/extractions/documents/_explain"
        );
        assert_eq!(
            job_url(host, Endpoint::Extraction),
            "https://api.dowjones.com/extractions/documents"
        );
    }

    #[test]
    fn test_status_url() {
        assert_eq!(
            status_url(
                "http://localhost:9000",
                Endpoint::TimeSeries,
                "abcd1234-ab12-ab12-ab12-abcdef123456"
            ),
            "http://localhost:9000/analytics/abcd1234-ab12-ab12-ab12-abcdef123456"
        );
    }
}
