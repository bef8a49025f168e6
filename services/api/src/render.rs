use vendowise::report::RiskSummary;
use vendowise::{DatasetKind, RecordOutcome, RiskFactor, RiskFactorConfig, ScoringMode};

pub(crate) fn render_policy(policy: &RiskFactorConfig) {
    println!("\nScoring: {}", describe_mode(&policy.scoring_mode));
    println!("Factors");
    for factor in RiskFactor::ordered() {
        let state = if policy.is_enabled(factor) { "on " } else { "off" };
        match factor.threshold_key() {
            Some(key) => println!(
                "- [{}] {}: breach when {} {} {}",
                state,
                factor.label(),
                factor.key(),
                factor.comparator().symbol(),
                policy
                    .threshold(key)
                    .map(|value| value.to_string())
                    .unwrap_or_else(|| "unset".to_string())
            ),
            None => println!(
                "- [{}] {}: breach when received < ordered",
                state,
                factor.label()
            ),
        }
    }
}

pub(crate) fn render_evaluation(
    kind: DatasetKind,
    policy: &RiskFactorConfig,
    outcomes: &[RecordOutcome],
    summary: &RiskSummary,
) {
    println!("Vendowise risk report");
    println!(
        "Dataset: {} ({} records) | scoring: {}",
        kind,
        summary.records,
        describe_mode(&policy.scoring_mode)
    );

    println!("\nClassification");
    for total in &summary.classifications {
        println!("- {}: {}", total.label, total.count);
    }
    if summary.invalid > 0 {
        println!("- Not evaluated: {}", summary.invalid);
    }

    if summary.reason_frequency.is_empty() {
        println!("\nBreached factors: none");
    } else {
        println!("\nBreached factors");
        for reason in &summary.reason_frequency {
            println!("- {}: {}", reason.label, reason.count);
        }
    }

    println!("\nRecords");
    for (position, outcome) in outcomes.iter().enumerate() {
        match outcome {
            Ok(verdict) => println!("{:>4}. {}: {}", position + 1, verdict.subject, verdict.summary()),
            Err(err) => println!("{:>4}. skipped: {}", position + 1, err),
        }
    }
}

fn describe_mode(mode: &ScoringMode) -> String {
    match mode {
        ScoringMode::AnyTrigger => "any trigger (one breach is high risk)".to_string(),
        ScoringMode::CountThreshold { min_count } => {
            format!("count threshold (high risk at {min_count}+ breaches)")
        }
        ScoringMode::Weighted {
            high_cutoff,
            medium_cutoff,
            ..
        } => format!("weighted (high > {high_cutoff}, medium > {medium_cutoff})"),
    }
}
