//! Endpoint joining for OpenAI-compatible base URLs.

/// Join a base URL and an API operation path.
///
/// Bare hosts get `/v1` inserted; bases that already end in a version
/// segment (`/v1`, `/v4`, …) or in the operation itself are left alone.
pub fn join(base_url: &str, operation: &str) -> String {
    let base = base_url.trim_end_matches('/');
    if base.ends_with(&format!("/{operation}")) {
        return base.to_string();
    }
    if has_version_suffix(base) {
        return format!("{base}/{operation}");
    }
    format!("{base}/v1/{operation}")
}

fn has_version_suffix(base: &str) -> bool {
    let Some(segment) = base.rsplit('/').next() else {
        return false;
    };
    let Some(digits) = segment.strip_prefix('v') else {
        return false;
    };
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::join;

    #[test]
    fn bare_host_gets_a_v1_prefix() {
        assert_eq!(
            join("https://api.openai.com", "chat/completions"),
            "https://api.openai.com/v1/chat/completions"
        );
    }

    #[test]
    fn versioned_base_keeps_its_version() {
        assert_eq!(
            join("https://open.bigmodel.cn/api/paas/v4", "embeddings"),
            "https://open.bigmodel.cn/api/paas/v4/embeddings"
        );
    }

    #[test]
    fn trailing_slashes_are_trimmed() {
        assert_eq!(
            join("https://api.openai.com/v1/", "embeddings"),
            "https://api.openai.com/v1/embeddings"
        );
    }

    #[test]
    fn complete_operation_urls_are_preserved() {
        assert_eq!(
            join("https://api.example.com/v1/embeddings", "embeddings"),
            "https://api.example.com/v1/embeddings"
        );
    }
}
