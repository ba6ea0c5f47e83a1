use autoswagger::{
    annotation::{controller::AnnotationCache, AnnotationParser},
    cli::generate,
    config::GeneratorOptions,
    extractor::{extract_routes, load_route_list},
    openapi_builder::assemble,
    scanner::{FsSourceProvider, SourceProvider},
    schema::{examples::ExampleGenerator, registry::SchemaRegistry},
    serializer::{serialize_json, serialize_yaml},
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tempfile::TempDir;

/// Helper function to create a temporary test project
fn create_test_project(files: Vec<(&str, &str)>) -> TempDir {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");

    for (path, content) in files {
        let file_path = temp_dir.path().join(path);
        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        std::fs::write(&file_path, content).expect("Failed to write test file");
    }

    temp_dir
}

fn blog_project() -> TempDir {
    create_test_project(vec![
        ("app/models/user.ts", include_str!("fixtures/blog/app/models/user.ts")),
        ("app/models/post.ts", include_str!("fixtures/blog/app/models/post.ts")),
        ("app/models/comment.ts", include_str!("fixtures/blog/app/models/comment.ts")),
        (
            "app/interfaces/pagination.ts",
            include_str!("fixtures/blog/app/interfaces/pagination.ts"),
        ),
        (
            "app/controllers/users_controller.ts",
            include_str!("fixtures/blog/app/controllers/users_controller.ts"),
        ),
        (
            "app/controllers/posts_controller.ts",
            include_str!("fixtures/blog/app/controllers/posts_controller.ts"),
        ),
        ("routes.json", include_str!("fixtures/blog/routes.json")),
        ("autoswagger.yml", include_str!("fixtures/blog/autoswagger.yml")),
    ])
}

/// Generates the blog document and returns it as JSON
fn blog_document() -> Value {
    let temp_dir = blog_project();
    let root = temp_dir.path();
    let options = GeneratorOptions::from_file(&root.join("autoswagger.yml")).expect("Failed to load options");
    let entries = load_route_list(&root.join("routes.json")).expect("Failed to load routes");
    let document = generate(root, &entries, &options).expect("Generation failed");

    let json = serialize_json(&document).expect("Failed to serialize");
    serde_json::from_str(&json).expect("Output is not valid JSON")
}

fn keys(value: &Value) -> Vec<&str> {
    value
        .as_object()
        .map(|object| object.keys().map(String::as_str).collect())
        .unwrap_or_default()
}

fn example<'a>(operation: &'a Value, status: &str) -> &'a Value {
    &operation["responses"][status]["content"]["application/json"]["example"]
}

#[test]
fn test_blog_document_structure() {
    let doc = blog_document();

    assert_eq!(doc["openapi"], "3.0.0");
    assert_eq!(doc["info"], json!({ "title": "Blog API", "version": "2.0.0" }));

    // ignored /swagger route is absent, paths keep route-list order
    assert_eq!(
        keys(&doc["paths"]),
        vec!["/api/users", "/api/users/{id}", "/api/posts", "/api/posts/{id}", "/health"]
    );

    // interfaces are registered before models, models in file order
    assert_eq!(
        keys(&doc["components"]["schemas"]),
        vec!["Any", "PaginationMeta", "Comment", "Post", "User"]
    );
    assert_eq!(doc["components"]["schemas"]["User"]["description"], "Model");
    assert_eq!(doc["components"]["schemas"]["PaginationMeta"]["description"], "Interface");
    assert_eq!(
        doc["components"]["securitySchemes"]["BearerAuth"],
        json!({ "type": "http", "scheme": "bearer" })
    );

    let tags: Vec<&str> = doc["tags"]
        .as_array()
        .unwrap()
        .iter()
        .map(|tag| tag["name"].as_str().unwrap())
        .collect();
    assert_eq!(tags, vec!["USERS", "BLOG", "POSTS", "HEALTH"]);
}

#[test]
fn test_model_schemas() {
    let doc = blog_document();
    let user = &doc["components"]["schemas"]["User"]["properties"];

    assert_eq!(
        keys(user),
        vec!["id", "full_name", "email", "password", "role", "posts", "created_at", "updated_at"]
    );
    assert_eq!(
        user["email"],
        json!({ "type": "string", "format": "email", "example": "johndoe@example.com" })
    );
    assert_eq!(user["full_name"]["nullable"], true);
    assert_eq!(user["role"]["enum"], json!(["admin", "editor", "reader"]));
    assert_eq!(
        user["posts"],
        json!({ "type": "array", "items": { "$ref": "#/components/schemas/Post" } })
    );
    assert_eq!(user["created_at"]["format"], "date-time");

    let post = &doc["components"]["schemas"]["Post"]["properties"];
    assert_eq!(post["title"]["example"], "Hello world");
    assert_eq!(post["author"], json!({ "$ref": "#/components/schemas/User" }));
}

#[test]
fn test_list_endpoint() {
    let doc = blog_document();
    let index = &doc["paths"]["/api/users"]["get"];

    assert_eq!(index["summary"], "List users");
    assert_eq!(index["tags"], json!(["USERS"]));
    assert_eq!(
        index["description"],
        "_app/controllers/users_controller_ - **index**"
    );
    assert!(doc["paths"]["/api/users"]["head"].is_null());

    let parameters: Vec<&str> = index["parameters"]
        .as_array()
        .unwrap()
        .iter()
        .map(|param| param["name"].as_str().unwrap())
        .collect();
    assert_eq!(parameters, vec!["page", "sortBy", "order"]);
    assert_eq!(index["parameters"][0]["schema"]["example"], 2);
    assert_eq!(index["parameters"][2]["schema"]["enum"], json!(["asc", "desc"]));

    let ok = &index["responses"]["200"];
    assert_eq!(ok["description"], "Returns **list** of **User** (with: posts)");
    assert_eq!(
        ok["content"]["application/json"]["schema"],
        json!({ "type": "array", "items": { "$ref": "#/components/schemas/User" } })
    );
    assert_eq!(ok["headers"]["X-Total-Pages"]["schema"]["example"], 5);

    let users = example(index, "200").as_array().unwrap();
    assert_eq!(users.len(), 1);
    let user = &users[0];
    assert_eq!(
        keys(user),
        vec!["id", "full_name", "email", "role", "posts", "created_at", "updated_at"]
    );
    // relations of included relations stay out unless asked for
    let post = &user["posts"][0];
    assert_eq!(post["title"], "Hello world");
    assert!(post.get("author").is_none());
    assert!(post.get("comments").is_none());
}

#[test]
fn test_nested_relation_paths() {
    let doc = blog_document();
    let show = &doc["paths"]["/api/users/{id}"]["get"];

    assert_eq!(show["summary"], "Get a single instance of users");
    assert_eq!(show["parameters"][0]["name"], "id");
    assert_eq!(show["parameters"][0]["required"], true);
    assert_eq!(show["parameters"][0]["schema"]["type"], "integer");

    let user = example(show, "200");
    let comment = &user["posts"][0]["comments"][0];
    assert_eq!(keys(comment), vec!["id", "body"]);
    assert_eq!(show["responses"]["404"]["description"], "User not found");

    // secured by the auth middleware
    assert_eq!(show["security"], json!([{ "BearerAuth": ["access"] }]));
    assert!(show["responses"]["401"].is_object());
    assert!(show["responses"]["403"].is_object());
}

#[test]
fn test_write_endpoints() {
    let doc = blog_document();

    let store = &doc["paths"]["/api/users"]["post"];
    assert_eq!(
        store["description"],
        "Registers a new account\n\n_app/controllers/users_controller_ - **store**"
    );
    let body = &store["requestBody"]["content"]["application/json"];
    assert_eq!(body["schema"], json!({ "$ref": "#/components/schemas/User" }));
    assert_eq!(keys(&body["example"]), vec!["email", "password"]);

    let created = example(store, "201");
    assert!(created.get("created_at").is_none());
    assert!(created.get("password").is_none());
    assert!(created.get("posts").is_none());
    assert_eq!(
        example(store, "422"),
        &json!({ "errors": [{ "field": "email", "message": "required" }] })
    );

    // only the preferred one of PUT/PATCH is documented
    let user_path = &doc["paths"]["/api/users/{id}"];
    assert_eq!(keys(user_path), vec!["get", "put", "delete"]);
    let update = &user_path["put"];
    assert_eq!(update["summary"], "Update users");
    assert_eq!(
        update["requestBody"]["content"]["application/json"]["example"],
        json!({ "fullName": "Jane Doe" })
    );
    assert_eq!(keys(&update["responses"]), vec!["204"]);

    let destroy = &user_path["delete"];
    assert_eq!(destroy["summary"], "Delete users");
    assert_eq!(keys(&destroy["responses"]), vec!["202", "401", "403"]);
    assert!(destroy.get("requestBody").is_none());
}

#[test]
fn test_inline_references_in_json_fragments() {
    let doc = blog_document();
    let index = &doc["paths"]["/api/posts"]["get"];

    assert_eq!(index["tags"], json!(["BLOG"]));
    let page = example(index, "200");
    assert_eq!(keys(page), vec!["data", "meta"]);

    let post = &page["data"][0];
    assert_eq!(post["title"], "Hello world");
    assert!(post["author"].is_object());
    assert!(post["author"].get("posts").is_none());
    assert!(post.get("comments").is_none());
    assert_eq!(
        keys(&page["meta"]),
        vec!["total", "perPage", "currentPage", "nextPageUrl"]
    );

    let show = &doc["paths"]["/api/posts/{id}"]["get"];
    let post = example(show, "200");
    assert!(post["author"].is_object());
    assert!(post["comments"].is_array());
    // the malformed fragment keeps its response, without content
    assert_eq!(show["responses"]["400"], json!({ "description": "broken" }));
}

#[test]
fn test_closure_route() {
    let doc = blog_document();
    let health = &doc["paths"]["/health"]["get"];
    assert_eq!(health["tags"], json!(["HEALTH"]));
    assert!(health.get("summary").is_none());
    assert!(health.get("description").is_none());
    assert_eq!(health["responses"]["200"]["description"], "Returns **200** (OK)");
}

#[test]
fn test_seeded_generation_is_deterministic() {
    let first = blog_document();
    let second = blog_document();
    assert_eq!(first, second);
}

#[test]
fn test_legacy_route_list() {
    let temp_dir = create_test_project(vec![
        (
            "app/Controllers/Http/UsersController.js",
            include_str!("fixtures/legacy/app/Controllers/Http/UsersController.js"),
        ),
        (
            "app/interfaces/account.ts",
            include_str!("fixtures/legacy/app/interfaces/account.ts"),
        ),
        ("routes.json", include_str!("fixtures/legacy/routes.json")),
    ]);
    let root = temp_dir.path();

    let entries = load_route_list(&root.join("routes.json")).unwrap();
    let document = generate(root, &entries, &GeneratorOptions::default()).unwrap();
    let yaml = serialize_yaml(&document).unwrap();
    let doc: Value = serde_yaml::from_str(&yaml).unwrap();

    assert_eq!(keys(&doc["paths"]), vec!["/users/{id}", "/"]);

    let show = &doc["paths"]["/users/{id}"]["get"];
    assert_eq!(show["summary"], "Show a user");
    assert_eq!(
        show["description"],
        "_app/Controllers/Http/UsersController_ - **show**"
    );
    let account = example(show, "200");
    assert_eq!(account["email"], "johndoe@example.com");
    assert!(account["roles"].is_array());
    assert_eq!(keys(&show["responses"]), vec!["200", "401", "403"]);

    // the root route has no segment to tag it with
    assert!(doc["paths"]["/"]["get"].get("tags").is_none());
}

#[test]
fn test_each_controller_file_is_parsed_once() {
    let temp_dir = blog_project();
    let root = temp_dir.path();
    let options = GeneratorOptions::default();

    let provider = FsSourceProvider::new(root.to_path_buf(), &options.models_path, &options.interfaces_path);
    let mut examples = ExampleGenerator::new(Some(1));
    let registry = SchemaRegistry::build(
        &provider.interface_sources().unwrap(),
        &provider.model_sources().unwrap(),
        options.snake_case,
        &mut examples,
    );
    let entries = load_route_list(&root.join("routes.json")).unwrap();
    let routes = extract_routes(&entries, &options);

    let mut cache = AnnotationCache::new(&provider, AnnotationParser::new(&registry, &options));
    assemble(&routes, &mut cache, &registry, &options).unwrap();

    // seven controller routes over two files
    assert_eq!(cache.parsed_files(), 2);
}

#[test]
fn test_missing_controller_fails_generation() {
    let temp_dir = create_test_project(vec![(
        "routes.json",
        r##"[{"pattern": "/users", "methods": ["GET"],
             "handler": {"reference": "#controllers/users_controller.index"}}]"##,
    )]);
    let root = temp_dir.path();

    let entries = load_route_list(&root.join("routes.json")).unwrap();
    let err = generate(root, &entries, &GeneratorOptions::default()).unwrap_err();
    assert!(err.to_string().contains("users_controller"));
}
