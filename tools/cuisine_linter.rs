/// Cuisine Linter: validates a cuisine file against a phrase bank.
///
/// Usage: cuisine_linter <cuisine.ron> [--phrases <phrases.ron>]... [--trials <n>]
///
/// Without `--phrases` the bundled shared bank is used. Later phrase files
/// are merged over earlier ones.

use dishcraft::core::composition::check_configuration;
use dishcraft::core::fragment::{FragmentBank, Slot};
use dishcraft::core::pipeline::{DishSession, GenerationConfig};
use dishcraft::core::prose::REQUIRED_CATEGORIES;
use dishcraft::cuisine_templates;
use dishcraft::schema::cuisine::Cuisine;
use dishcraft::schema::ingredient::Role;
use std::collections::HashSet;
use std::path::Path;
use std::process;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_TRIALS: usize = 200;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with_target(false)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        println!("Usage: cuisine_linter <cuisine.ron> [--phrases <phrases.ron>]... [--trials <n>]");
        process::exit(0);
    }

    let cuisine_path = Path::new(&args[1]);
    let mut phrase_paths = Vec::new();
    let mut trials = DEFAULT_TRIALS;

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--phrases" if i + 1 < args.len() => {
                i += 1;
                phrase_paths.push(args[i].clone());
            }
            "--trials" if i + 1 < args.len() => {
                i += 1;
                trials = args[i].parse().unwrap_or_else(|_| {
                    error!(value = %args[i], "--trials expects a number");
                    process::exit(1);
                });
            }
            other => warn!(argument = other, "ignoring unknown argument"),
        }
        i += 1;
    }

    let cuisine = match Cuisine::load_from_ron(cuisine_path) {
        Ok(c) => c,
        Err(e) => {
            error!("failed to load cuisine file: {}", e);
            process::exit(1);
        }
    };

    let bank = match load_bank(&phrase_paths) {
        Ok(b) => b,
        Err(e) => {
            error!("failed to load phrase bank: {}", e);
            process::exit(1);
        }
    };

    info!(
        nation = %cuisine.nation.name,
        ingredients = cuisine.ingredients.len(),
        techniques = cuisine.techniques.len(),
        dish_types = cuisine.dish_rules.len(),
        categories = bank.categories.len(),
        "loaded"
    );

    let (errors, mut warnings) = lint_cuisine(&cuisine, &bank);
    if errors.is_empty() && trials > 0 {
        warnings.extend(trial_generations(&cuisine, &bank, trials));
    }

    println!("\n=== Cuisine Lint Report: {} ===\n", cuisine.nation.name);

    if errors.is_empty() && warnings.is_empty() {
        println!("All checks passed!");
    }

    for warning in &warnings {
        println!("WARNING: {}", warning);
    }

    for error in &errors {
        println!("ERROR: {}", error);
    }

    println!(
        "\nSummary: {} errors, {} warnings",
        errors.len(),
        warnings.len()
    );

    if !errors.is_empty() {
        process::exit(1);
    }
}

fn load_bank(paths: &[String]) -> Result<FragmentBank, Box<dyn std::error::Error>> {
    if paths.is_empty() {
        return Ok(cuisine_templates::phrases()?);
    }
    let mut bank = FragmentBank::default();
    for path in paths {
        debug!(%path, "merging phrase file");
        bank.merge(FragmentBank::load_from_ron(Path::new(path))?);
    }
    Ok(bank)
}

fn lint_cuisine(cuisine: &Cuisine, bank: &FragmentBank) -> (Vec<String>, Vec<String>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    // Check 1: every required phrase category is present
    for category in bank.missing_categories(&REQUIRED_CATEGORIES) {
        errors.push(format!("Phrase category '{}' is missing or empty", category));
    }

    // Check 2: each dish type passes the generation preflight
    for dish_type in cuisine.dish_types() {
        if let Some(rules) = cuisine.rules_for(dish_type) {
            if let Err(e) = check_configuration(&cuisine.ingredients, &cuisine.techniques, rules) {
                errors.push(format!("Dish type '{}': {}", dish_type, e));
            }
        }
    }

    // Check 3: duplicate ingredient and technique names
    let mut seen = HashSet::new();
    for ingredient in &cuisine.ingredients {
        if !seen.insert(ingredient.name.as_str()) {
            errors.push(format!("Ingredient '{}' is defined twice", ingredient.name));
        }
    }
    let mut seen = HashSet::new();
    for technique in &cuisine.techniques {
        if !seen.insert(technique.name.as_str()) {
            errors.push(format!("Technique '{}' is defined twice", technique.name));
        }
    }

    // Check 4: techniques naming dish types that do not exist
    let known: HashSet<&str> = cuisine.dish_types().into_iter().collect();
    for technique in &cuisine.techniques {
        for dish_type in &technique.dish_types {
            if !known.contains(dish_type.as_str()) {
                warnings.push(format!(
                    "Technique '{}' applies to unknown dish type '{}'",
                    technique.name, dish_type
                ));
            }
        }
    }

    // Check 5: roles with a single eligible ingredient repeat every dish
    for dish_type in cuisine.dish_types() {
        let Some(rules) = cuisine.rules_for(dish_type) else {
            continue;
        };
        for role in &rules.required_roles {
            let eligible = cuisine
                .ingredients
                .iter()
                .filter(|i| i.role == *role && rules.permits(i))
                .count();
            if eligible == 1 {
                warnings.push(format!(
                    "Dish type '{}' has only one eligible {} ingredient",
                    dish_type, role
                ));
            }
        }
    }

    // Check 6: roles no dish type can use
    for role in Role::ALL {
        let stocked = cuisine.ingredients.iter().any(|i| i.role == role);
        let used = cuisine.dish_rules.values().any(|r| {
            r.required_roles.contains(&role) || r.optional_roles.contains(&role)
        });
        if stocked && !used {
            warnings.push(format!("No dish type uses {} ingredients", role));
        }
    }

    // Check 7: festival and honorific slots with nothing to fill them
    let uses = |slot: Slot| {
        bank.categories
            .values()
            .flatten()
            .any(|f| f.slots().any(|s| s == slot))
    };
    if cuisine.nation.festivals.is_empty() && uses(Slot::Festival) {
        warnings.push("Nation has no festivals; festival fragments will be skipped".to_string());
    }
    if cuisine.nation.honorifics.is_empty() && uses(Slot::Honorific) {
        warnings.push("Nation has no honorifics; honorific fragments will be skipped".to_string());
    }

    // Check 8: fragments carrying their own terminal punctuation
    let mut names: Vec<&String> = bank.categories.keys().collect();
    names.sort();
    for name in names {
        for fragment in bank.category(name) {
            if fragment.text.trim_end().ends_with(['.', '!', '?']) {
                warnings.push(format!(
                    "Fragment in '{}' ends with punctuation: \"{}\"",
                    name, fragment.text
                ));
            }
        }
    }

    (errors, warnings)
}

/// Generate `trials` dishes per dish type and report high composition
/// failure rates.
fn trial_generations(cuisine: &Cuisine, bank: &FragmentBank, trials: usize) -> Vec<String> {
    let mut warnings = Vec::new();
    for dish_type in cuisine.dish_types() {
        let config = GenerationConfig::new(cuisine, bank, dish_type);
        let mut session = DishSession::new(0);
        let failures = (0..trials)
            .filter(|_| session.generate(&config).is_err())
            .count();
        let rate = failures as f64 / trials as f64;
        info!(dish_type, trials, failures, "trial generations");
        if rate > 0.2 {
            warnings.push(format!(
                "Dish type '{}' failed {} of {} trial generations ({:.0}%)",
                dish_type,
                failures,
                trials,
                rate * 100.0
            ));
        }
    }
    warnings
}
