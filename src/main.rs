mod config;
mod email;
mod flow;
mod quiz;
mod report;

use std::fs::File;
use std::io::BufReader;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dotenv::dotenv;
use teloxide::{
    dispatching::dialogue::{serializer::Json, ErasedStorage, SqliteStorage, Storage},
    prelude::*,
    types::{ChatId, KeyboardButton, KeyboardMarkup, KeyboardRemove},
};

use config::Config;
use flow::{AnswerStep, FinishedQuiz, State};
use quiz::{
    bank::QuestionBank,
    chat_lock::ChatLocks,
    countdown::Countdowns,
    sampler,
    scoring::ScoreBreakdown,
    session::{AnswerOutcome, QuizSession},
    Question,
};
use report::{store::ResultStore, webhook::Webhook, QuizReport, Reporter};

type QuizDialogue = Dialogue<State, ErasedStorage<State>>;
type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;
type QuizStorage = Arc<ErasedStorage<State>>;

/// Shared by every handler and countdown task.
pub struct QuizApp {
    bank: QuestionBank,
    question_count: i64,
    time_limit_secs: i64,
    game_name: String,
    reporter: Reporter,
    countdowns: Countdowns<ChatId>,
    locks: ChatLocks<ChatId>,
    storage: QuizStorage,
}

#[tokio::main]
async fn main() -> HandlerResult {
    let dotenv_result = dotenv();
    pretty_env_logger::init();
    if let Err(e) = dotenv_result {
        log::warn!("No .env file loaded: {}", e);
    }
    log::info!("Starting quiz bot...");

    let config = Config::from_env()?;

    let bank = match &config.questions_file {
        Some(path) => {
            log::info!("Loading questions from {}", path.display());
            QuestionBank::from_reader(BufReader::new(File::open(path)?))?
        }
        None => QuestionBank::builtin(),
    };
    if bank.is_empty() {
        log::warn!("Question bank is empty, every quiz will end immediately");
    }
    log::info!(
        "Question bank ready: {} questions, {} per quiz, {}s time limit",
        bank.len(),
        config.question_count,
        config.time_limit_secs
    );

    log::info!("Opening dialogue storage at {}", config.db_path);
    let storage: QuizStorage = SqliteStorage::open(&config.db_path, Json).await?.erase();

    let client = reqwest::Client::new();
    let store = match &config.supabase {
        Some(supabase) => Some(ResultStore::new(client.clone(), &supabase.url, &supabase.anon_key)),
        None => {
            log::warn!("Supabase is not configured, quiz results will not be saved. Set SUPABASE_URL and SUPABASE_ANON_KEY in your .env file.");
            None
        }
    };
    let webhook = config.webhook.as_ref().map(|w| {
        Webhook::new(client.clone(), &w.url, &w.element_id, &w.game_name, &w.location)
    });
    let reporter = Reporter::new(store, webhook);
    log::info!("{} result sink(s) configured", reporter.sink_count());

    let app = Arc::new(QuizApp {
        bank,
        question_count: config.question_count,
        time_limit_secs: config.time_limit_secs,
        game_name: config.game_name.clone(),
        reporter,
        countdowns: Countdowns::new(),
        locks: ChatLocks::new(),
        storage: storage.clone(),
    });

    let bot = Bot::from_env();

    Dispatcher::builder(
        bot,
        Update::filter_message()
            .enter_dialogue::<Message, ErasedStorage<State>, State>()
            .branch(dptree::case![State::Start].endpoint(start))
            .branch(dptree::case![State::ReceiveEmail].endpoint(receive_email))
            .branch(dptree::case![State::Quiz { session }].endpoint(answer_question))
            .branch(dptree::case![State::Results { email }].endpoint(results)),
    )
    .dependencies(dptree::deps![storage, app])
    .enable_ctrlc_handler()
    .build()
    .dispatch()
    .await;

    Ok(())
}

const GREETING_TEXT: &str =
    "Welcome to the quiz! Answer as many questions as you can before the clock runs out.\n\nPlease enter your e-mail address to play.";
const PLAY_AGAIN: &str = "Play again";
const NEW_PLAYER: &str = "New player";

async fn start(bot: Bot, dialogue: QuizDialogue, msg: Message) -> HandlerResult {
    bot.send_message(msg.chat.id, GREETING_TEXT)
        .reply_markup(KeyboardRemove::new())
        .await?;

    dialogue.update(State::ReceiveEmail).await?;
    Ok(())
}

async fn receive_email(
    bot: Bot,
    dialogue: QuizDialogue,
    msg: Message,
    app: Arc<QuizApp>,
) -> HandlerResult {
    let Some(email) = msg.text().map(str::trim) else {
        bot.send_message(msg.chat.id, "Please enter your e-mail address (as text)")
            .await?;
        return Ok(());
    };
    if !email::is_valid_email(email) {
        bot.send_message(
            msg.chat.id,
            "That doesn't look like an e-mail address, please try again",
        )
        .await?;
        return Ok(());
    }

    start_quiz(&bot, &dialogue, &app, email.to_string()).await
}

async fn start_quiz(
    bot: &Bot,
    dialogue: &QuizDialogue,
    app: &Arc<QuizApp>,
    email: String,
) -> HandlerResult {
    let chat_id = dialogue.chat_id();
    let questions = sampler::sample(&app.bank.questions, app.question_count);
    let session = QuizSession::new(email, questions, app.time_limit_secs, Utc::now());
    log::info!(
        "Chat {} started a quiz with {} questions",
        chat_id,
        session.questions.len()
    );

    let started_at = session.started_at;
    if let Some(finished) = flow::begin(dialogue, &app.locks, session.clone(), started_at).await? {
        return announce_results(bot, app, chat_id, finished).await;
    }
    start_countdown(bot.clone(), app.clone(), chat_id, started_at);

    bot.send_message(
        chat_id,
        format!(
            "Let's go! You have {} to answer {} questions.",
            format_time(app.time_limit_secs as f64),
            session.questions.len()
        ),
    )
    .await?;
    send_question(bot, chat_id, &session, Utc::now()).await
}

fn start_countdown(bot: Bot, app: Arc<QuizApp>, chat_id: ChatId, started_at: DateTime<Utc>) {
    let duration = Duration::from_secs(app.time_limit_secs.max(0) as u64);
    if app.countdowns.is_running(&chat_id) {
        log::debug!("Replacing running countdown for chat {}", chat_id);
    }
    let task_app = app.clone();
    app.countdowns.start(chat_id, duration, move || async move {
        task_app.countdowns.release(&chat_id);
        if let Err(e) = time_up(bot, task_app, chat_id, started_at).await {
            log::error!("Error finishing timed out quiz in chat {}: {}", chat_id, e);
        }
    });
}

async fn time_up(
    bot: Bot,
    app: Arc<QuizApp>,
    chat_id: ChatId,
    started_at: DateTime<Utc>,
) -> HandlerResult {
    let dialogue = QuizDialogue::new(app.storage.clone(), chat_id);

    // The participant may have finished, or started another quiz, in the meantime.
    let Some(finished) = flow::expire(&dialogue, &app.locks, started_at).await? else {
        return Ok(());
    };
    log::info!("Quiz in chat {} timed out", chat_id);
    bot.send_message(chat_id, "⏰ Time's up!").await?;
    announce_results(&bot, &app, chat_id, finished).await
}

async fn answer_question(
    bot: Bot,
    dialogue: QuizDialogue,
    msg: Message,
    app: Arc<QuizApp>,
) -> HandlerResult {
    let now = Utc::now();

    match flow::answer(&dialogue, &app.locks, msg.text(), now).await? {
        AnswerStep::Ignored => {
            log::debug!("Chat {} answered after its quiz ended", msg.chat.id);
            Ok(())
        }
        AnswerStep::Unrecognized(question) => {
            bot.send_message(msg.chat.id, "Please choose one of the options")
                .reply_markup(option_keyboard(&question))
                .await?;
            Ok(())
        }
        AnswerStep::Next { outcome, session } => {
            bot.send_message(msg.chat.id, feedback_text(&outcome)).await?;
            send_question(&bot, msg.chat.id, &session, now).await
        }
        AnswerStep::Finished { outcome, finished } => {
            if let Some(outcome) = outcome {
                bot.send_message(msg.chat.id, feedback_text(&outcome)).await?;
            }
            announce_results(&bot, &app, msg.chat.id, finished).await
        }
    }
}

/// Runs after the dialogue already moved to `Results`.
async fn announce_results(
    bot: &Bot,
    app: &QuizApp,
    chat_id: ChatId,
    finished: FinishedQuiz,
) -> HandlerResult {
    app.countdowns.cancel(&chat_id);

    let breakdown = finished.breakdown;
    log::info!(
        "Chat {} finished{}: {}/{} correct, final score {}",
        chat_id,
        if finished.timed_out { " (timed out)" } else { "" },
        breakdown.correct_answers,
        breakdown.total_questions,
        breakdown.final_score
    );

    app.reporter.dispatch(QuizReport::new(
        &finished.email,
        &app.game_name,
        &breakdown,
        Utc::now(),
    ));

    bot.send_message(chat_id, results_text(&breakdown))
        .reply_markup(results_keyboard())
        .await?;
    Ok(())
}

fn feedback_text(outcome: &AnswerOutcome) -> String {
    match outcome {
        AnswerOutcome::Correct => "✅ Correct!".to_string(),
        AnswerOutcome::Wrong {
            correct_option: Some(correct),
        } => format!("❌ Wrong! The correct answer was {}", correct),
        AnswerOutcome::Wrong { correct_option: None } => "❌ Wrong!".to_string(),
        AnswerOutcome::Expired => "⏰ Time's up! That answer came too late.".to_string(),
    }
}

async fn results(
    bot: Bot,
    dialogue: QuizDialogue,
    email: String,
    msg: Message,
    app: Arc<QuizApp>,
) -> HandlerResult {
    match msg.text() {
        Some(PLAY_AGAIN) => start_quiz(&bot, &dialogue, &app, email).await,
        Some(NEW_PLAYER) => {
            bot.send_message(msg.chat.id, "Please enter your e-mail address to play.")
                .reply_markup(KeyboardRemove::new())
                .await?;
            dialogue.update(State::ReceiveEmail).await?;
            Ok(())
        }
        _ => {
            bot.send_message(msg.chat.id, "Please choose one of the options")
                .reply_markup(results_keyboard())
                .await?;
            Ok(())
        }
    }
}

async fn send_question(
    bot: &Bot,
    chat_id: ChatId,
    session: &QuizSession,
    now: DateTime<Utc>,
) -> HandlerResult {
    let Some(question) = session.current_question() else {
        return Ok(());
    };

    let text = format!(
        "Question {} of {}:\n{}\n\n⏱ {} left",
        session.question_number(),
        session.questions.len(),
        question.question,
        format_time(session.time_remaining(now))
    );
    bot.send_message(chat_id, text)
        .reply_markup(option_keyboard(question))
        .await?;
    Ok(())
}

fn option_keyboard(question: &Question) -> KeyboardMarkup {
    KeyboardMarkup::new(
        question
            .option_labels()
            .into_iter()
            .map(|label| vec![KeyboardButton::new(label)]),
    )
}

fn results_keyboard() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![vec![
        KeyboardButton::new(PLAY_AGAIN),
        KeyboardButton::new(NEW_PLAYER),
    ]])
}

fn results_text(breakdown: &ScoreBreakdown) -> String {
    let headline = if breakdown.correct_answers == 0 {
        "Better luck next time!"
    } else {
        "CONGRATULATIONS!"
    };
    format!(
        "{}\n\nCorrect answers: {}/{}\nAccuracy: {:.1}/5\nSpeed: {:.1}/5\nFinal score: {:.1}/10\nTime used: {} of {}",
        headline,
        breakdown.correct_answers,
        breakdown.total_questions,
        breakdown.points_score,
        breakdown.time_score,
        breakdown.final_score,
        format_time(breakdown.time_used as f64),
        format_time(breakdown.total_time as f64)
    )
}

/// `m:ss`, rounding partial seconds up so the clock never shows 0:00 early.
fn format_time(seconds: f64) -> String {
    let seconds = seconds.max(0.0).ceil() as i64;
    format!("{}:{:02}", seconds / 60, seconds % 60)
}
