//! Prints a bcrypt hash suitable for `ADMIN_HASH_PASSWORD`.

use bcrypt::{hash, DEFAULT_COST};
use std::env;

fn main() {
    let password = env::args().nth(1).unwrap_or_else(|| {
        eprintln!("Usage: cargo run --bin hash-password <PASSWORD> [COST]");
        std::process::exit(1);
    });

    let cost = match env::args().nth(2).map(|raw| raw.parse::<u32>()) {
        None => DEFAULT_COST,
        Some(Ok(cost)) if (10..=31).contains(&cost) => cost,
        Some(_) => {
            eprintln!("COST must be a number between 10 and 31");
            std::process::exit(1);
        }
    };

    if password.chars().count() < 8 {
        eprintln!("Warning: admin passwords shorter than 8 characters are rejected by the API");
    }

    match hash(&password, cost) {
        Ok(hashed) => {
            println!("\nCost     : {}", cost);
            println!("Hash     : {}\n", hashed);
            println!("# Paste this into your .env:");
            println!("ADMIN_HASH_PASSWORD={}", hashed);
        }
        Err(e) => {
            eprintln!("Error hashing password: {}", e);
            std::process::exit(1);
        }
    }
}
