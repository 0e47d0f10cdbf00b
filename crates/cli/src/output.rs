//! Terminal output.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use tokio::sync::broadcast;

use virtual_wardrobe_core::{Cart, Product, TryOnResult, UserSummary};
use virtual_wardrobe_storefront::navigation;
use virtual_wardrobe_storefront::notices::{Notice, NoticeLevel};
use virtual_wardrobe_storefront::session::{Session, SessionStatus};

use crate::commands::CliError;

pub fn signed_in(user: &UserSummary) {
    println!("Signed in as {}", user.display_name());
}

pub fn signed_out() {
    println!("Signed out");
}

pub fn session(session: &Session) {
    match (session.status(), session.user()) {
        (SessionStatus::Authenticated, Some(user)) => {
            println!("{} <{}> (user {})", user.display_name(), user.email, user.id);
        }
        _ => println!("Not signed in"),
    }
}

pub fn products(products: &[Product]) {
    if products.is_empty() {
        println!("No products");
        return;
    }
    for product in products {
        println!(
            "{:>4}  {:<32} {:<16} {:>10}  {}",
            product.id, product.name, product.brand, product.price.to_string(), product.category
        );
    }
}

pub fn product(product: &Product) {
    println!("{} by {}", product.name, product.brand);
    println!("{}  ({})", product.price, product.category);
    if !product.description.is_empty() {
        println!();
        println!("{}", product.description);
    }
    if !product.colors.is_empty() {
        println!("Colors: {}", product.colors.join(", "));
    }
    if !product.sizes.is_empty() {
        println!("Sizes:  {}", product.sizes.join(", "));
    }
    for detail in &product.details {
        println!("  - {detail}");
    }
}

pub fn cart(cart: &Cart) {
    if cart.is_empty() {
        println!("Your cart is empty");
        return;
    }
    for item in &cart.items {
        println!(
            "{:>4}  {:<32} {:<6} {:<10} x{:<3} {:>10}",
            item.id,
            item.product.name,
            item.size,
            item.color,
            item.quantity,
            item.product.price.to_string()
        );
    }
    println!("{} items, total {}", cart.item_count(), cart.total);
}

pub fn try_on(result: &TryOnResult) {
    println!("{}", result.result_image);
}

/// Print every notice raised during the command.
pub fn notices(mut notices: broadcast::Receiver<Notice>) {
    while let Ok(notice) = notices.try_recv() {
        match notice.level {
            NoticeLevel::Error => eprintln!("✗ {notice}"),
            NoticeLevel::Success => eprintln!("✓ {notice}"),
        }
    }
}

/// Explain a redirect to sign-in, if the session was revoked.
pub fn redirects(history: &[String]) {
    let revoked = history
        .iter()
        .skip(1)
        .any(|location| navigation::is_sign_in(location));
    if revoked {
        eprintln!("Your session has ended. Sign in again with `wardrobe login`.");
    }
}

pub fn failure(error: &CliError) {
    eprintln!("Error: {}", error.message());
}
