//! Browser Demo
//!
//! Drives a browser router over an in-memory history: startup navigation,
//! link clicks, named navigation and back/forward.

use isoroute::*;

fn main() -> Result<(), RouterError> {
    env_logger::init();

    let history = MemoryHistory::new("http://localhost/")?;
    let mut router = Router::browser(history.clone());

    router.bind(EventKind::NavigationComplete, |event| {
        println!("   complete: {}", event.path);
    });
    router.bind(EventKind::NotFound, |event| {
        println!("   not found: {}", event.path);
    });

    router
        .get_named(
            "home",
            "/",
            [handler_fn(|cxt| {
                println!("home ({})", cxt.cause());
                cxt.next();
                Ok(())
            })],
        )?
        .get_named(
            "user",
            "/users/{id}",
            [handler_fn(|cxt| {
                println!(
                    "user {} (tab: {})",
                    cxt.params().get("id").map(String::as_str).unwrap_or("?"),
                    cxt.query().get("tab").map(String::as_str).unwrap_or("profile")
                );
                cxt.next();
                Ok(())
            })],
        )?
        // Ignored: only GET routes exist in the browser
        .post("/users", [handler_fn(|_cxt| Ok(()))])?;

    router.start(StartOptions::new().auto_start(true));

    let mut click = ClickEvent::on(Anchor::new("/users/7"));
    router.handle_click(&mut click);

    router.navigate(
        "user",
        NavigateOptions::new()
            .params(RouteParams::new().with("id", "7"))
            .query(QueryParams::new().with("tab", "posts")),
    );
    router.navigate_to("/nowhere");

    while let Some(popped) = history.back() {
        router.handle_pop_state(&popped);
    }

    println!("history: {:?}", history.calls());
    router.stop();
    Ok(())
}
