use rand::Rng;

/// Browser-like header set presented to the platform.
#[derive(Debug, Clone)]
pub struct HeaderProfile {
    pub user_agent: String,
    pub accept_language: String,
}

impl HeaderProfile {
    /// Generate a randomized header profile
    pub fn randomized() -> Self {
        let mut rng = rand::thread_rng();

        // Common desktop user agents
        let user_agents = [
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
            "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
            "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
        ];

        let languages = ["en-US,en;q=0.9", "en-GB,en;q=0.9", "en-US,en;q=0.8"];

        let ua_idx = rng.gen_range(0..user_agents.len());
        let lang_idx = rng.gen_range(0..languages.len());

        Self {
            user_agent: user_agents[ua_idx].to_string(),
            accept_language: languages[lang_idx].to_string(),
        }
    }

    /// Headers sent with every platform request.
    pub fn headers(&self, base_url: &str, app_id: &str) -> Vec<(String, String)> {
        let base = base_url.trim_end_matches('/');
        [
            ("User-Agent", self.user_agent.as_str()),
            ("Accept", "*/*"),
            ("Accept-Language", self.accept_language.as_str()),
            ("Sec-Fetch-Dest", "empty"),
            ("Sec-Fetch-Mode", "cors"),
            ("Sec-Fetch-Site", "same-origin"),
            ("X-IG-App-ID", app_id),
            ("X-IG-WWW-Claim", "0"),
            ("X-Requested-With", "XMLHttpRequest"),
        ]
        .into_iter()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .chain(std::iter::once(("Referer".to_string(), format!("{base}/"))))
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_randomized_profile() {
        let profile = HeaderProfile::randomized();
        assert!(profile.user_agent.starts_with("Mozilla/5.0"));
        assert!(!profile.accept_language.is_empty());
    }

    #[test]
    fn test_profile_variation() {
        // Probabilistic, but 20 draws from 4 agents all matching is very unlikely
        let profiles: Vec<_> = (0..20).map(|_| HeaderProfile::randomized()).collect();

        let first_ua = &profiles[0].user_agent;
        let all_same = profiles.iter().all(|p| &p.user_agent == first_ua);
        assert!(!all_same, "Expected variation in user agents");
    }

    #[test]
    fn test_headers_include_app_id_and_referer() {
        let profile = HeaderProfile::randomized();
        let headers = profile.headers("https://example.com/", "1234");

        assert!(headers.contains(&("X-IG-App-ID".to_string(), "1234".to_string())));
        assert!(headers.contains(&("Referer".to_string(), "https://example.com/".to_string())));
        assert!(headers.iter().any(|(name, _)| name == "User-Agent"));
    }
}
