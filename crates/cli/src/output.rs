//! Terminal output utilities
//!
//! Provides consistent formatting for CLI output.

use owo_colors::OwoColorize;
use workkar_discovery::{AnnotatedWorker, CategoryFacet, Page};

/// Shown in place of a distance when the viewer has no location
pub const UNKNOWN_DISTANCE: &str = "Know the distance";

/// Status message helpers
pub struct Status;

impl Status {
    /// Print a success message
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Print an error message
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Print a warning message
    pub fn warning(message: &str) {
        eprintln!("{} {}", "⚠".yellow(), message);
    }

    /// Print an info message
    pub fn info(message: &str) {
        println!("{} {}", "ℹ".blue(), message);
    }

    /// Print a header
    pub fn header(message: &str) {
        println!();
        println!("{}", message.bold());
        println!("{}", "─".repeat(message.chars().count()));
    }
}

/// `"6.2 km away"`, or the set-your-location prompt when unknown
pub fn format_distance(distance_km: Option<f64>) -> String {
    match distance_km {
        Some(km) => format!("{km:.1} km away"),
        None => UNKNOWN_DISTANCE.to_string(),
    }
}

/// `"★ 4.6 (12 reviews)"`
pub fn format_rating(rating: f64, reviews: u32) -> String {
    format!(
        "★ {:.1} ({})",
        rating,
        format_count(reviews as usize, "review", "reviews")
    )
}

/// Format a count with singular/plural
pub fn format_count(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{count} {singular}")
    } else {
        format!("{count} {plural}")
    }
}

/// Format an age in seconds for display (`"45s"`, `"12m"`, `"3h"`, `"2d"`)
pub fn format_age(secs: i64) -> String {
    let secs = secs.max(0);
    match secs {
        0..60 => format!("{secs}s"),
        60..3600 => format!("{}m", secs / 60),
        3600..86_400 => format!("{}h", secs / 3600),
        _ => format!("{}d", secs / 86_400),
    }
}

/// One plain-text line per worker card
pub fn worker_line(worker: &AnnotatedWorker) -> String {
    let record = &worker.worker;
    let mut line = format!("{} · {}", record.name, record.category);

    if let Some(business) = &record.business_name {
        line.push_str(&format!(" · {business}"));
    }

    line.push_str(&format!(
        " · {} · {}",
        format_rating(record.rating, record.review_count),
        format_distance(worker.distance_km)
    ));
    line
}

/// Print one page of workers
pub fn print_page(page: &Page<AnnotatedWorker>, page_size: usize) {
    if page.items.is_empty() {
        Status::info("No workers match");
        return;
    }

    for (offset, worker) in page.items.iter().enumerate() {
        let number = format!("{:>3}.", (page.page - 1) * page_size + offset + 1);
        let text = worker_line(worker);
        if worker.distance_km.is_some() {
            println!("{} {}", number.dimmed(), text);
        } else {
            println!("{} {}", number.dimmed(), text.dimmed());
        }
    }

    println!();
    println!(
        "{}",
        format!(
            "Page {} of {} · {}",
            page.page,
            page.total_pages,
            format_count(page.total_items, "worker", "workers")
        )
        .dimmed()
    );
}

/// Print category facets with counts
pub fn print_categories(categories: &[CategoryFacet]) {
    if categories.is_empty() {
        Status::info("No categories");
        return;
    }

    let width = categories.iter().map(|c| c.label.chars().count()).max().unwrap_or(0);
    for facet in categories {
        println!("  {:<width$}  {}", facet.label, facet.count.dimmed());
    }
}
