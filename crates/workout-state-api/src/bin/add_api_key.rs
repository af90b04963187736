use chrono::Utc;
use rand::Rng;
use workout_state_core::{ApiKeyRecord, DynamoStore, WorkoutCode};

/// Options for provisioning one API key.
#[derive(Debug, Default, PartialEq, Eq)]
struct Args {
    code: Option<String>,
    key: Option<String>,
    description: Option<String>,
}

#[tokio::main]
async fn main() {
    let table_name = match std::env::var("CACHE_TABLE_NAME") {
        Ok(name) if !name.is_empty() => name,
        _ => {
            eprintln!("CACHE_TABLE_NAME environment variable must be set");
            std::process::exit(1);
        }
    };

    let args = parse_args(std::env::args().skip(1));

    let Some(code) = args.code else {
        eprintln!("--code is mandatory");
        std::process::exit(1);
    };
    let code = WorkoutCode::from(code);

    let api_key = match args.key {
        Some(key) if key.is_empty() => {
            eprintln!("--key must not be empty");
            std::process::exit(1);
        }
        Some(key) => key,
        None => generate_api_key(),
    };

    let mut record = ApiKeyRecord::new(&code, api_key.clone());
    record.description = args.description;
    record.created_at = Some(Utc::now().timestamp());

    let store = DynamoStore::new(table_name).await;
    if let Err(e) = store.put_api_key(&record).await {
        eprintln!("Failed to store API key in DynamoDB: {e}");
        std::process::exit(1);
    }

    println!("API key for {code}: {api_key}");
}

/// 32 random bytes, hex-encoded to 64 characters.
fn generate_api_key() -> String {
    let random_bytes: [u8; 32] = rand::rng().random();
    random_bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Parse `--code <value>`, `--key <value>` and `--description <value>`.
fn parse_args(args: impl IntoIterator<Item = String>) -> Args {
    let mut parsed = Args::default();

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        let slot = match arg.as_str() {
            "--code" => &mut parsed.code,
            "--key" => &mut parsed.key,
            "--description" => &mut parsed.description,
            _ => continue,
        };
        *slot = iter.next();
    }

    parsed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Args {
        parse_args(list.iter().map(|s| s.to_string()))
    }

    #[test]
    fn parses_all_flags() {
        assert_eq!(
            args(&["--code", "abc", "--key", "k", "--description", "gym tv"]),
            Args {
                code: Some("abc".into()),
                key: Some("k".into()),
                description: Some("gym tv".into()),
            }
        );
    }

    #[test]
    fn flags_are_optional_and_unknown_ones_ignored() {
        assert_eq!(
            args(&["--verbose", "--code", "abc"]),
            Args {
                code: Some("abc".into()),
                ..Args::default()
            }
        );
        assert_eq!(args(&["--code"]), Args::default());
    }

    #[test]
    fn generated_keys_are_64_hex_chars() {
        let key = generate_api_key();
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(key, generate_api_key());
    }
}
