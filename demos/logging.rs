//! Example demonstrating logging capabilities
//!
//! Run with JSON logging (production):
//! ```bash
//! cargo run --example logging --features logging-json
//! ```
//!
//! Run with pretty logging (development):
//! ```bash
//! cargo run --example logging --features logging-pretty
//! ```

use service_container::{ClassDescriptor, Container, ServiceDefinition, Value};

// Example services
struct Database {
    url: String,
    connected: bool,
}

struct UserService {
    name: String,
    page_size: i64,
}

fn main() {
    // Initialize logging - uses JSON if logging-json feature enabled,
    // pretty if logging-pretty enabled
    #[cfg(feature = "logging")]
    {
        service_container::logging::init();
    }

    println!("=== Service Container Logging Demo ===\n");

    // Create the container (logs: "Creating new service container")
    let container = Container::with_parameters([("env", Value::from("demo"))]);

    // Define classes (logs: "Defining class")
    container.define_class(
        ClassDescriptor::builder("Database", |args| {
            Ok(Database {
                url: args.str(0)?.to_owned(),
                connected: false,
            })
        })
        .method0("connect", |db: &mut Database| {
            println!("  [App] Database connecting...");
            db.connected = true;
        })
        .build(),
    );
    container.define_class(
        ClassDescriptor::builder("UserService", |_args| {
            Ok(UserService {
                name: "UserService".into(),
                page_size: 20,
            })
        })
        .method("set_page_size", 1, |users: &mut UserService, args| {
            users.page_size = args.int(0)?;
            Ok(())
        })
        .build(),
    );

    // Register services (logs: "Registering service")
    container
        .register_service(
            "db",
            ServiceDefinition::new("Database")
                .arg("postgres://localhost/mydb")
                .method("connect"),
        )
        .unwrap();
    container
        .register_service(
            "users",
            ServiceDefinition::new("UserService").call("set_page_size", [50]),
        )
        .unwrap();

    // Resolve services (logs: "Resolving service (cache miss)", "Constructing service instance",
    // "Applying initialization step", "Service resolved and cached")
    let db = container.get::<Database>("db").unwrap();
    let users = container.get::<UserService>("users").unwrap();
    println!("  [App] {} connected: {}", db.url, db.connected);
    println!("  [App] {} page size: {}", users.name, users.page_size);

    // Resolve again (logs: "Service resolved from cache")
    let db_again = container.get::<Database>("db").unwrap();
    assert!(std::sync::Arc::ptr_eq(&db, &db_again));

    // Try to get a service that doesn't exist (logs: "Service not found in container")
    let missing = container.try_get::<Database>("cache");
    assert!(missing.is_none());

    // Register a duplicate (logs: "Service name already registered")
    assert!(container.register_service("db", "Database").is_err());

    println!("\n=== Demo Complete ===");
    println!("Check the log output above to see structured logging in action!");
    println!("\nTip: Use --features logging-json for production (JSON output)");
    println!("     Use --features logging-pretty for development (colorful output)");
}
