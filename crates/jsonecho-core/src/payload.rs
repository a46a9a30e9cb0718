//! Benchmark payloads

use bytes::Bytes;

/// Number of user records in the large payload
pub const LARGE_PAYLOAD_USERS: usize = 500;

/// Small fixed request body
pub const SMALL_PAYLOAD: &str = r#"{
		"name": "John Doe",
		"email": "john@example.com",
		"age": 30,
		"address": {
			"street": "123 Main St",
			"city": "Tokyo",
			"country": "Japan"
		},
		"tags": ["developer", "golang", "backend"]
	}"#;

/// `{"users":[...]}` with `count` generated user records.
///
/// Deterministic: the same `count` always yields the same bytes.
pub fn generate_users(count: usize) -> Bytes {
    let mut out = String::with_capacity(16 + count * 512);
    out.push_str(r#"{"users":["#);

    for i in 0..count {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&format!(
            r#"{{
			"id": {i},
			"name": "User {i}",
			"email": "user{i}@example.com",
			"age": {age},
			"address": {{
				"street": "{i} Main Street",
				"city": "City {i}",
				"country": "Country {i}",
				"zipcode": "{i:05}"
			}},
			"tags": ["tag1", "tag2", "tag3", "tag4", "tag5"],
			"metadata": {{
				"created_at": "2024-01-01T00:00:00Z",
				"updated_at": "2024-12-31T23:59:59Z",
				"status": "active",
				"verified": true
			}}
		}}"#,
            i = i,
            age = 20 + i % 50,
        ));
    }

    out.push_str("]}");
    Bytes::from(out)
}

/// The 500-user payload
pub fn generate_large_json() -> Bytes {
    generate_users(LARGE_PAYLOAD_USERS)
}

/// `"<n> bytes (<k> KB)"`
pub fn describe_size(len: usize) -> String {
    format!("{} bytes ({:.2} KB)", len, len as f64 / 1024.0)
}
