//! Server Demo
//!
//! Mounts a router as HTTP middleware and feeds it a few requests, the way a
//! host server would: unmatched requests and failures fall through to the
//! host's own `next` handler.

use http::{Method, Request, Response, StatusCode};
use isoroute::*;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut router = Router::server();

    router.bind(EventKind::Navigating, |event| {
        println!("-> {} {} ({:?})", event.method, event.path, event.cause);
    });
    router.bind(EventKind::NotFound, |event| {
        println!("?? {} {}", event.method, event.path);
    });
    router.bind(EventKind::Error, |event| {
        if let Some(error) = &event.error {
            println!("!! {} {}: {}", event.method, event.path, error);
        }
    });

    router
        .get(
            "/hello/{name}",
            [
                handler_fn(|cxt| {
                    println!("   cause of this request: {}", cxt.cause());
                    cxt.next();
                    Ok(())
                }),
                handler_fn(|cxt| {
                    let name = cxt.params().get_decoded("name").unwrap_or_default();
                    let greeting = match cxt.query().get("lang").map(String::as_str) {
                        Some("fr") => "Bonjour",
                        _ => "Hello",
                    };
                    if let Some(response) = cxt.response_mut() {
                        *response.body_mut() = format!("{}, {}", greeting, name).into_bytes();
                    }
                    Ok(())
                }),
            ],
        )?
        .post(
            "/orders/{id}(\\d+)",
            [handler_fn(|cxt| {
                let id: u64 = cxt.params().get_as("id").unwrap_or_default();
                if id == 0 {
                    anyhow::bail!("order 0 does not exist");
                }
                if let Some(response) = cxt.response_mut() {
                    *response.status_mut() = StatusCode::CREATED;
                }
                Ok(())
            })],
        )?;

    let server = router
        .start(StartOptions::default())
        .ok_or("router is not server-hosted")?;

    let requests = [
        (Method::GET, "/hello/World"),
        (Method::GET, "/hello/Monde?lang=fr"),
        (Method::POST, "/orders/17"),
        (Method::POST, "/orders/0"),
        (Method::GET, "/missing"),
    ];

    for (method, uri) in requests {
        let mut request = Request::builder().method(method).uri(uri).body(Body::new())?;
        let mut response = Response::new(Body::new());
        let mut fell_through = None;

        server.dispatch(&mut request, &mut response, |failure| {
            fell_through = Some(failure);
        });

        match fell_through {
            None => println!(
                "   {} {}",
                response.status(),
                String::from_utf8_lossy(response.body())
            ),
            Some(None) => println!("   host: 404 Not Found"),
            Some(Some(failure)) => println!("   host: 500 ({})", failure),
        }
    }

    Ok(())
}
