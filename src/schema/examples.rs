//! Realistic example values for schema properties.
//!
//! Examples are derived from the field name first (`email`, `first_name`, ...)
//! and fall back to the property type. Numeric examples are pseudo-random; the
//! generator can be seeded to make a run reproducible.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{json, Value};

/// Example used for every `date-time` property.
pub const DATE_TIME_EXAMPLE: &str = "2021-03-23T16:13:08.489+01:00";
/// Example used for every `date` property.
pub const DATE_EXAMPLE: &str = "2021-03-23";
/// Example used for `email` properties.
pub const EMAIL_EXAMPLE: &str = "johndoe@example.com";

/// Produces example values for parsed properties.
pub struct ExampleGenerator {
    rng: StdRng,
}

impl ExampleGenerator {
    /// Creates a generator; `seed` makes the numeric examples reproducible.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }

    /// Example for a well-known field name, if there is one.
    pub fn by_field(&self, field: &str) -> Option<Value> {
        let example = match field {
            "email" => json!(EMAIL_EXAMPLE),
            "first_name" | "firstName" | "firstname" => json!("John"),
            "last_name" | "lastName" | "lastname" => json!("Doe"),
            "name" | "full_name" | "fullName" => json!("John Doe"),
            "username" | "user_name" => json!("johndoe"),
            "phone" | "phone_number" | "phoneNumber" => json!("+1 555 123 4567"),
            "title" => json!("Lorem Ipsum"),
            "description" | "content" | "body" => json!("Lorem ipsum dolor sit amet"),
            "url" | "website" | "link" => json!("https://example.com"),
            "avatar" | "image" | "picture" => json!("https://example.com/avatar.png"),
            "uuid" | "uid" => json!("a11bd2f4-3d1e-4d3b-9c6e-8a1e2f9b0c7d"),
            "token" | "remember_me_token" => json!("Oat.MTI3.b2x8QW"),
            "country" => json!("Germany"),
            "city" => json!("Berlin"),
            "street" | "address" => json!("Main Street 1"),
            "zip" | "zip_code" | "postal_code" => json!("10115"),
            "slug" => json!("lorem-ipsum"),
            "created_at" | "updated_at" | "deleted_at" | "createdAt" | "updatedAt"
            | "deletedAt" => json!(DATE_TIME_EXAMPLE),
            _ => return None,
        };
        Some(example)
    }

    /// Example for an OpenAPI primitive type and optional format.
    pub fn by_type(&mut self, type_name: &str, format: Option<&str>) -> Value {
        match (type_name, format) {
            ("string", Some("date-time")) => json!(DATE_TIME_EXAMPLE),
            ("string", Some("date")) => json!(DATE_EXAMPLE),
            ("string", _) => json!("Some string"),
            ("number", Some("float")) => json!(1.5),
            ("number", _) | ("integer", _) => json!(self.random_integer()),
            ("boolean", _) => json!(true),
            _ => Value::Null,
        }
    }

    /// A pseudo-random integer in `0..1000`.
    pub fn random_integer(&mut self) -> i64 {
        self.rng.gen_range(0..1000)
    }
}

impl Default for ExampleGenerator {
    fn default() -> Self {
        Self::new(None)
    }
}

/// Converts a literal example token into a JSON value matching the type.
pub fn coerce_example(raw: &str, type_name: &str) -> Value {
    let raw = raw.trim();
    match type_name {
        "integer" | "number" | "float" | "double" => {
            if let Ok(int) = raw.parse::<i64>() {
                return json!(int);
            }
            if let Ok(float) = raw.parse::<f64>() {
                return json!(float);
            }
        }
        "boolean" => {
            if let Ok(flag) = raw.parse::<bool>() {
                return json!(flag);
            }
        }
        _ => {}
    }
    json!(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_by_field_known_names() {
        let generator = ExampleGenerator::new(Some(1));
        assert_eq!(generator.by_field("email"), Some(json!(EMAIL_EXAMPLE)));
        assert_eq!(generator.by_field("created_at"), Some(json!(DATE_TIME_EXAMPLE)));
        assert_eq!(generator.by_field("password"), None);
        assert_eq!(generator.by_field("something_else"), None);
    }

    #[test]
    fn test_by_type() {
        let mut generator = ExampleGenerator::new(Some(1));
        assert_eq!(generator.by_type("boolean", None), json!(true));
        assert_eq!(generator.by_type("string", Some("date")), json!(DATE_EXAMPLE));
        assert!(generator.by_type("integer", None).is_i64());
        assert_eq!(generator.by_type("object", None), Value::Null);
    }

    #[test]
    fn test_seeded_generators_agree() {
        let mut a = ExampleGenerator::new(Some(42));
        let mut b = ExampleGenerator::new(Some(42));
        for _ in 0..5 {
            assert_eq!(a.random_integer(), b.random_integer());
        }
    }

    #[test]
    fn test_coerce_example() {
        assert_eq!(coerce_example("42", "integer"), json!(42));
        assert_eq!(coerce_example("2.5", "number"), json!(2.5));
        assert_eq!(coerce_example("false", "boolean"), json!(false));
        assert_eq!(coerce_example("abc", "integer"), json!("abc"));
        assert_eq!(coerce_example("hello world", "string"), json!("hello world"));
    }
}
