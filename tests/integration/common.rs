//! Shared fixtures

use sitelens::config::UserAgentConfig;
use sitelens::HttpAnalyzer;

/// One h1, two external links, one internal link, and a password input
pub const FIXTURE_PAGE: &str = r#"<!DOCTYPE html>
<html>
  <head><title>Example</title></head>
  <body>
    <h1>Welcome</h1>
    <a href="https://other.example/a">Elsewhere</a>
    <a href="http://another.example/b">Also elsewhere</a>
    <a href="/about">About</a>
    <form><input type="password" name="pw"></form>
  </body>
</html>"#;

pub fn analyzer() -> HttpAnalyzer {
    HttpAnalyzer::new(&UserAgentConfig {
        crawler_name: "TestBot".to_string(),
        crawler_version: "1.0.0".to_string(),
    })
    .expect("Failed to build analyzer")
}
