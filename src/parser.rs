use serde::Deserialize;

/// A suite file as written on disk.
#[derive(Deserialize, Debug, Clone)]
pub struct Suite {
    pub setup: Setup,
    pub global: Option<Global>,
    pub tests: Vec<Test>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Setup {
    pub base_url: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Global {
    pub headers: Option<toml::Value>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Test {
    pub name: String,
    pub method: String,
    pub url: String,
    pub query: Option<toml::Value>,
    pub headers: Option<toml::Value>,
    /// A table is sent as JSON, a string as is.
    pub body: Option<serde_json::Value>,
    pub assert_status: Option<i32>,
    pub assert_headers: Option<toml::Value>,
    /// Field path to expected value.
    pub assert_fields: Option<serde_json::Value>,
    pub assert_empty_body: Option<bool>,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parses_a_suite() {
        let src = r#"
            [setup]
            base_url = "https://reqres.in"

            [global]
            headers = { "Content-Type" = "application/json" }

            [[tests]]
            name = "create user"
            method = "POST"
            url = "/api/users"
            body = { name = "morpheus", job = "leader" }
            assert_status = 201
            assert_fields = { name = "morpheus", "data.email[0]" = "x" }

            [[tests]]
            name = "delete user"
            method = "DELETE"
            url = "/api/users/2"
            assert_status = 204
            assert_empty_body = true
        "#;

        let suite: Suite = toml::from_str(src).unwrap();

        assert_eq!(suite.setup.base_url, "https://reqres.in");
        assert!(suite.global.unwrap().headers.is_some());
        assert_eq!(suite.tests.len(), 2);

        let create = &suite.tests[0];
        assert_eq!(
            create.body,
            Some(serde_json::json!({ "name": "morpheus", "job": "leader" }))
        );
        assert_eq!(
            create.assert_fields,
            Some(serde_json::json!({ "name": "morpheus", "data.email[0]": "x" }))
        );
        assert_eq!(suite.tests[1].assert_empty_body, Some(true));
    }
}
