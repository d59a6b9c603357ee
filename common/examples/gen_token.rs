// Mint a superuser token for the task info endpoints
// Usage: cargo run -p common --example gen_token -- [username]

use common::auth::JwtService;
use common::config::Settings;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let username = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "admin".to_string());

    let settings = Settings::load()?;
    let jwt = JwtService::new(&settings.auth.jwt_secret, settings.auth.jwt_expiration_hours);

    let token = jwt.encode_token(&uuid::Uuid::new_v4().to_string(), &username, true)?;
    println!("Username: {}", username);
    println!("Token: {}", token);

    // Verify it works
    let claims = jwt.decode_token(&token)?;
    println!("Superuser: {}", claims.is_superuser);

    Ok(())
}
