use scriptcond_canonical::{canonicalizer::Canonicalizer, Digest, ProfileId};
use serde_json::json;

fn main() {
    let profile = ProfileId::parse("scriptcond-canonical-v1").expect("valid profile");
    let canonicalizer = Canonicalizer::new(profile);
    let result = json!({
        "output": ["Hello world"],
        "signature": {"r": "0x01", "s": "0x02"},
        "amount": 42
    });

    match canonicalizer.canonicalize(&result) {
        Ok(form) => {
            println!("{}", form.as_str());
            println!("{}", Digest::sha256(&form.bytes));
        }
        Err(err) => {
            eprintln!("canonicalization failed: {}", err);
            std::process::exit(1);
        }
    }
}
