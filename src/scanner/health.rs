//! Composite repository health score.

use crate::models::{
    round_to, HealthFactors, MaintenanceIndicators, RepositoryContext, RepositoryHealth,
};

fn size_factor(total_files: usize) -> (f64, &'static str) {
    match total_files {
        n if n < 10 => (0.8, "Very small"),
        n if n < 50 => (0.9, "Small"),
        n if n < 200 => (1.0, "Medium"),
        n if n < 500 => (0.9, "Large"),
        _ => (0.7, "Very large"),
    }
}

fn complexity_factor(total_loc: usize) -> (f64, &'static str) {
    match total_loc {
        n if n < 1_000 => (1.0, "Simple"),
        n if n < 10_000 => (0.9, "Moderate"),
        n if n < 50_000 => (0.8, "Complex"),
        _ => (0.7, "Very complex"),
    }
}

fn diversity_factor(languages: usize) -> f64 {
    match languages {
        1 => 1.0,
        0 | 2..=3 => 0.95,
        4..=5 => 0.85,
        _ => 0.75,
    }
}

/// Compute the health block from the statistics already gathered.
pub fn assess(context: &RepositoryContext, has_readme: bool) -> RepositoryHealth {
    let (size, size_category) = size_factor(context.total_files);
    let (complexity, complexity_level) = complexity_factor(context.lines_of_code.total);
    let config_count = context.configuration_files.len();

    let factors = HealthFactors {
        size,
        complexity,
        language_diversity: diversity_factor(context.languages.len()),
        configuration: 0.7 + (0.1 * config_count as f64).min(0.3),
    };

    let score = round_to(
        25.0 * (factors.size + factors.complexity + factors.language_diversity + factors.configuration),
        1,
    );

    RepositoryHealth {
        score,
        factors,
        size_category: size_category.to_string(),
        complexity_level: complexity_level.to_string(),
        maintenance_indicators: MaintenanceIndicators {
            has_readme,
            has_dockerfile: context
                .configuration_files
                .iter()
                .any(|f| f.config_type == "Docker Container"),
            has_dependencies: !context.dependencies.is_empty(),
            has_config_files: config_count > 0,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ConfigFile;

    #[test]
    fn test_small_single_language_repo() {
        let mut context = RepositoryContext::empty("demo");
        context.total_files = 5;
        context.lines_of_code.total = 200;
        context.languages.insert("Python".to_string(), 5);

        let health = assess(&context, false);

        assert_eq!(health.size_category, "Very small");
        assert_eq!(health.complexity_level, "Simple");
        // 25 * (0.8 + 1.0 + 1.0 + 0.7) = 87.5
        assert!((health.score - 87.5).abs() < 1e-9);
        assert!(!health.maintenance_indicators.has_config_files);
    }

    #[test]
    fn test_configuration_bonus_is_capped() {
        let mut context = RepositoryContext::empty("demo");
        context.total_files = 120;
        context.lines_of_code.total = 20_000;
        for lang in ["Python", "Go", "Rust", "Shell"] {
            context.languages.insert(lang.to_string(), 1);
        }
        for i in 0..5 {
            context.configuration_files.push(ConfigFile {
                file: format!("svc{}/Dockerfile", i),
                config_type: "Docker Container".to_string(),
                size: 10,
            });
        }

        let health = assess(&context, true);

        assert!((health.factors.configuration - 1.0).abs() < 1e-9);
        // 25 * (1.0 + 0.8 + 0.85 + 1.0) = 91.25, rounded to one decimal
        assert!((health.score - 91.25).abs() <= 0.05 + 1e-9);
        assert!(health.maintenance_indicators.has_dockerfile);
        assert!(health.maintenance_indicators.has_readme);
    }

    #[test]
    fn test_repo_without_known_language() {
        let mut context = RepositoryContext::empty("demo");
        context.total_files = 3;

        let health = assess(&context, false);

        assert!((health.factors.language_diversity - 0.95).abs() < 1e-9);
        // 25 * (0.8 + 1.0 + 0.95 + 0.7) = 86.25, rounded to one decimal
        assert!((health.score - 86.25).abs() <= 0.05 + 1e-9);
    }
}
