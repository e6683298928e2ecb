/// Tasting Menu example: one course of every dish type from each bundled
/// cuisine, with rich lore and emoji names.
///
/// Run with: cargo run --example tasting_menu

use dishcraft::core::pipeline::{DishSession, GenerationConfig, GenerationOptions};
use dishcraft::core::prose::LoreIntensity;
use dishcraft::cuisine_templates;
use dishcraft::schema::dish::GeneratedDish;

const MAX_ATTEMPTS: usize = 5;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let kitchens = cuisine_templates::all().expect("Failed to load bundled cuisines");

    let options = GenerationOptions {
        include_emoji: true,
        lore: LoreIntensity::Rich,
        batch_variation: true,
        rarity_curve: None,
    };

    let mut session = DishSession::builder().seed(2026).build();

    for (cuisine, phrases) in &kitchens {
        println!("=== A {} Tasting Menu ===\n", cuisine.nation.demonym);

        for dish_type in cuisine.dish_types() {
            let config = GenerationConfig::new(cuisine, phrases, dish_type).with_options(options);

            // Composition errors are one bad draw; try again with the next seed.
            let mut course = None;
            for _ in 0..MAX_ATTEMPTS {
                match session.generate(&config) {
                    Ok(dish) => {
                        course = Some(dish);
                        break;
                    }
                    Err(e) if e.is_retryable() => continue,
                    Err(e) => {
                        eprintln!("Cannot serve {}: {}", dish_type, e);
                        break;
                    }
                }
            }

            match course {
                Some(dish) => print_course(&dish),
                None => println!("[{}] The kitchen could not agree on this course.\n", dish_type),
            }
        }

        // Keep half the history between menus.
        session.soft_reset();
    }

    println!(
        "Served {} dishes from seed {}.",
        session.generation_count(),
        session.seed()
    );
}

fn print_course(dish: &GeneratedDish<'_>) {
    println!("[{}] {}", dish.dish_type, dish.name);
    println!("  {}", dish.description);
    if let Some(lore) = &dish.lore {
        println!("  Lore: {}", lore);
    }
    println!(
        "  {} | {} | serves {} | {}",
        dish.ingredient_names().join(", "),
        dish.technique.name,
        dish.serving_size,
        dish.difficulty.name()
    );
    println!("  {}\n", dish.benefit);
}
