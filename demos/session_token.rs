use anyhow::Result;

use checklib::{now, Cache};

// Fakes the usual "reuse the API session between runs" pattern: the first
// run logs in and caches the token, later runs pick it up until it expires.
//
// Usage: cargo run --example session_token

fn login() -> String {
    // a real check would do an authentication round trip here
    format!("token-{}", now())
}

fn main() -> Result<()> {
    let cache = Cache::open_default()?;

    match cache.get("demo-session-token") {
        Some(token) => println!("reusing cached token {token}"),
        None => {
            let token = login();
            if cache.set("demo-session-token", &token, now() + 30) {
                println!("logged in, cached token {token} for 30s");
            } else {
                println!("logged in, caching not available, token {token}");
            }
        }
    }
    Ok(())
}
