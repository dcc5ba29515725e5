// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Test data generators for abuse simulation.

/// Generate a pool of client addresses for testing.
pub fn generate_client_ips(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| {
            // Use 10.x.x.x private range
            let a = (i >> 16) & 0xFF;
            let b = (i >> 8) & 0xFF;
            let c = i & 0xFF;
            format!("10.{a}.{b}.{c}")
        })
        .collect()
}

/// Origins that must never pass the default allow-list.
pub fn generate_spoofed_origins() -> Vec<Option<&'static str>> {
    vec![
        None,
        Some("null"),
        Some(""),
        Some("https://evil.example"),
        // Scheme downgrade
        Some("http://goault.com"),
        // Suffix and prefix tricks
        Some("https://goault.com.evil.example"),
        Some("https://evilgoault.com"),
        Some("https://goault.co"),
        // Non-default port
        Some("https://goault.com:8443"),
        // Subdomain of an allowed host
        Some("https://www.goault.com"),
        Some("file:///etc/passwd"),
        Some("not a url"),
    ]
}

/// Bot-style submissions with the honeypot filled in.
pub fn generate_honeypot_payloads(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| {
            serde_json::json!({
                "fullName": format!("Bot {i}"),
                "email": format!("bot{i}@spam.example"),
                "message": "Buy now",
                "_gotcha": format!("https://spam.example/{i}"),
            })
            .to_string()
        })
        .collect()
}

/// A legitimate submission without an email address (one send per request).
pub fn anonymous_payload(i: usize) -> String {
    serde_json::json!({
        "fullName": format!("Visitor {i}"),
        "message": "Hello",
    })
    .to_string()
}
