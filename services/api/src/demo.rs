use crate::infra::{open_session, parse_category, parse_score, recommendation_service};
use career_roadmap::config::AppConfig;
use career_roadmap::error::AppError;
use career_roadmap::recommendations::{
    BatchOutcome, CandidateScore, Category, RecommendationRequest,
};
use career_roadmap::roadmap::{RoadmapView, SessionError, Step, StepKind, TargetGoal};
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Persist the demo session under this directory instead of in memory.
    #[arg(long)]
    pub(crate) session_dir: Option<PathBuf>,
    /// Skip the recommendation board portion of the demo.
    #[arg(long)]
    pub(crate) skip_recommendations: bool,
}

#[derive(Args, Debug)]
pub(crate) struct RecommendArgs {
    /// Candidate category (streams, exams or jobs)
    #[arg(long, value_parser = parse_category)]
    pub(crate) category: Category,
    /// Scored candidate as ID=SCORE; repeat for each candidate
    #[arg(long = "score", value_parser = parse_score, required = true)]
    pub(crate) scores: Vec<CandidateScore>,
    /// JSON catalog to resolve candidate details (defaults to the built-in catalog)
    #[arg(long)]
    pub(crate) catalog: Option<PathBuf>,
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        session_dir,
        skip_recommendations,
    } = args;

    let mut config = AppConfig::load()?;
    if session_dir.is_some() {
        config.session.directory = session_dir;
    }

    println!("Career roadmap demo");
    match &config.session.directory {
        Some(dir) => println!("  Session store: {} (key '{}')", dir.display(), config.session.key),
        None => println!("  Session store: in memory"),
    }

    let shared = open_session(&config.session)?;
    let mut session = shared.lock().expect("session mutex poisoned");
    if !session.sequence().is_empty() {
        println!("  Resuming saved progress; starting over for the demo");
        session.reset()?;
    }

    session.append(Step::new(StepKind::EducationLevel, 10, "Class 10"))?;
    session.append(Step::new(StepKind::Stream, 1, "Science (PCM)"))?;
    session.insert_before_last_of_kind(
        StepKind::Stream,
        Step::new(StepKind::Exam, 30, "JEE Main").with_description("Engineering entrance"),
    )?;
    print_roadmap("\nAfter choosing level, stream and exam", &session.snapshot());

    let removed = session.remove_from_kind(StepKind::Exam)?;
    println!("\nBacktracked to the exam screen ({removed} step(s) cleared)");
    session.append(Step::new(StepKind::Stream, 2, "Science (PCB)"))?;
    session.insert_before_last_of_kind(
        StepKind::Stream,
        Step::new(StepKind::Exam, 31, "NEET UG").with_description("Medical entrance"),
    )?;
    print_roadmap("Revised roadmap", &session.snapshot());

    match session.save() {
        Err(err @ SessionError::Incomplete { .. }) => println!("\nSave blocked: {err}"),
        Err(err) => return Err(err.into()),
        Ok(_) => println!("\nSave unexpectedly accepted without a goal"),
    }

    session.set_target_goal(
        TargetGoal::new(504, "Doctor (MBBS)").with_salary_range("8-20 LPA"),
    )?;
    let saved = session.save()?;
    println!(
        "Saved roadmap with {} step(s) toward '{}' at {}",
        saved.steps.len(),
        saved.target_goal.title,
        saved.saved_at.to_rfc3339()
    );
    println!(
        "  Session cleared after save: {}",
        session.sequence().is_torn_down()
    );
    drop(session);

    if skip_recommendations {
        return Ok(());
    }

    let service = recommendation_service(&config.recommendations)?;
    let request = RecommendationRequest {
        streams: scores(&[(1, 72), (2, 91), (3, 48)]),
        exams: scores(&[(30, 66), (31, 94), (999, 99)]),
        jobs: scores(&[(504, 89), (501, 89), (503, 55)]),
    };
    let board = service.recommend(request).await?;

    println!("\nRecommendation board");
    for outcome in [&board.streams, &board.exams, &board.jobs] {
        print_outcome(outcome);
    }

    Ok(())
}

pub(crate) async fn run_recommend(args: RecommendArgs) -> Result<(), AppError> {
    let RecommendArgs {
        category,
        scores,
        catalog,
    } = args;

    let mut config = AppConfig::load()?;
    if catalog.is_some() {
        config.recommendations.catalog_path = catalog;
    }

    let service = recommendation_service(&config.recommendations)?;
    let outcome = service.recommend_category(category, &scores).await?;
    print_outcome(&outcome);
    Ok(())
}

fn scores(pairs: &[(u32, u32)]) -> Vec<CandidateScore> {
    pairs
        .iter()
        .map(|&(id, score)| CandidateScore { id, score })
        .collect()
}

fn print_roadmap(heading: &str, view: &RoadmapView) {
    println!("{heading}:");
    if view.steps.is_empty() {
        println!("  (no steps yet)");
    }
    for entry in &view.steps {
        let description = entry
            .step
            .description
            .as_deref()
            .map(|text| format!(" - {text}"))
            .unwrap_or_default();
        println!(
            "  {}. [{}] {}{}",
            entry.position + 1,
            entry.step.kind.label(),
            entry.step.title,
            description
        );
    }
    match &view.target_goal {
        Some(goal) => println!("  Goal: {}", goal.title),
        None => println!("  Goal: not chosen"),
    }
    println!("  Ready to save: {}", if view.valid { "yes" } else { "no" });
}

fn print_outcome(outcome: &BatchOutcome) {
    println!("  {}:", outcome.category.label());
    if outcome.no_data {
        println!("    No recommendations available");
        return;
    }
    for result in &outcome.results {
        let marker = if result.top_match { " (top match)" } else { "" };
        println!(
            "    #{} {} [id {}] score {}{}",
            result.rank, result.name, result.id, result.score, marker
        );
        for (key, value) in &result.attributes {
            println!("      {key}: {value}");
        }
    }
    if outcome.deadline_expired {
        println!("    Batch deadline reached; showing partial results");
    }
}
