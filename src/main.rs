//! Scenario Quest - Entry Point
//!
//! Terminal front end over the library: pretest, themed play, custom
//! themes, wrong-answer review and deterministic quiz sets. Every failure
//! ends in a notice and a way back to the prompt.

use scenario_quest::core::config::QuestConfig;
use scenario_quest::core::error::{QuestError, Result};
use scenario_quest::core::session::SessionIdentity;
use scenario_quest::core::types::{Category, Difficulty, Level};
use scenario_quest::llm::{author_custom_theme, LlmClient};
use scenario_quest::pretest::{load_questions, Pretest, QuestionSource};
use scenario_quest::progress::{list_wrong_answers, remove_wrong_answer, ReviewFeedback, ReviewSession};
use scenario_quest::quizset::{get_or_create, QuizRequest};
use scenario_quest::rewrite::RuleEngine;
use scenario_quest::routes::Route;
use scenario_quest::scenarios::{self, PlaySession, MAIN_THEMES};
use scenario_quest::settings::{SessionCache, SettingsStore};
use scenario_quest::storage::{MemoryStore, ScenarioWithOptions};

use clap::Parser;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;
use tokio::runtime::Runtime;
use tracing_subscriber::EnvFilter;

/// Scenario Quest - leveled situational-judgment quizzes
#[derive(Parser, Debug)]
#[command(name = "scenario-quest")]
#[command(about = "Play leveled situational-judgment quizzes in the terminal")]
struct Args {
    /// Config file (TOML); defaults apply when missing
    #[arg(long, default_value = "scenario-quest.toml")]
    config: PathBuf,

    /// Directory for the store snapshot and settings
    #[arg(long, env = "SCENARIO_QUEST_DATA", default_value = ".scenario-quest")]
    data_dir: PathBuf,

    /// Never call the generation service
    #[arg(long)]
    offline: bool,

    /// Level scenarios through the generation service (overwrites stored text)
    #[arg(long)]
    delegated_rewrite: bool,
}

/// A user-facing failure message
struct Notice {
    title: &'static str,
    message: String,
}

impl Notice {
    fn from_error(err: &QuestError) -> Self {
        match err {
            QuestError::LlmError(_) => Notice {
                title: "생성 서비스 오류",
                message: "지금은 새 내용을 만들 수 없어요. 잠시 후 다시 해 보세요.".into(),
            },
            QuestError::MalformedResponse(_) => Notice {
                title: "내용을 만들지 못했어요",
                message: "다시 한 번 시도해 주세요.".into(),
            },
            QuestError::Storage(_) | QuestError::IoError(_) => Notice {
                title: "저장소 오류",
                message: "불러오거나 저장하지 못했어요.".into(),
            },
            QuestError::NotFound(what) => Notice {
                title: "찾을 수 없어요",
                message: what.clone(),
            },
            QuestError::InvalidInput(what) => Notice {
                title: "입력을 확인해 주세요",
                message: what.clone(),
            },
            other => Notice {
                title: "문제가 생겼어요",
                message: other.to_string(),
            },
        }
    }

    fn show(&self) {
        println!("[{}] {}", self.title, self.message);
    }
}

struct App {
    config: QuestConfig,
    store: MemoryStore,
    settings: SettingsStore,
    cache: SessionCache,
    session: SessionIdentity,
    rules: RuleEngine,
    client: Option<LlmClient>,
    delegated_rewrite: bool,
    rt: Runtime,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("scenario_quest=info")),
        )
        .init();

    let args = Args::parse();
    let config = QuestConfig::load(&args.config)?;
    let rules = match &config.rules_path {
        Some(path) => RuleEngine::load(path)?,
        None => RuleEngine::builtin()?,
    };

    let store = MemoryStore::open(args.data_dir.join("store.json"))?;
    let mut settings = SettingsStore::open(args.data_dir.join("settings.toml"))?;
    let session = SessionIdentity::resolve(config.session_policy, &mut settings)?;

    let client = if args.offline {
        None
    } else {
        let timeout = Duration::from_secs(config.request_timeout_secs);
        match LlmClient::from_env(&config.llm, timeout) {
            Ok(client) => Some(client),
            Err(e) => {
                tracing::warn!("generation service unavailable, running offline: {}", e);
                None
            }
        }
    };

    tracing::info!(session = %session, online = client.is_some(), "Scenario Quest starting");

    let mut app = App {
        config,
        store,
        settings,
        cache: SessionCache::new(),
        session,
        rules,
        client,
        delegated_rewrite: args.delegated_rewrite,
        rt: Runtime::new()?,
    };
    app.run()
}

fn prompt(label: &str) -> io::Result<String> {
    print!("{}", label);
    io::stdout().flush()?;
    read_input(&mut io::stdin().lock())
}

/// One trimmed line; a closed input is `UnexpectedEof`, never an empty line
fn read_input(reader: &mut impl BufRead) -> io::Result<String> {
    let mut input = String::new();
    if reader.read_line(&mut input)? == 0 {
        return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "input closed"));
    }
    Ok(input.trim().to_string())
}

fn is_end_of_input(err: &QuestError) -> bool {
    matches!(err, QuestError::IoError(e) if e.kind() == io::ErrorKind::UnexpectedEof)
}

/// 1-based menu number to a 0-based index
fn parse_choice(input: &str, len: usize) -> Option<usize> {
    input.parse::<usize>().ok().filter(|n| (1..=len).contains(n)).map(|n| n - 1)
}

fn print_scenario(scenario: &ScenarioWithOptions) {
    println!();
    println!("## {}", scenario.scenario.title);
    println!("{}", scenario.scenario.situation);
    for (i, option) in scenario.options.iter().enumerate() {
        println!("  {}. {}", i + 1, option.text);
    }
}

impl App {
    fn run(&mut self) -> Result<()> {
        println!("\n=== SCENARIO QUEST ===");
        self.print_help();

        let mut route = Route::Home;
        loop {
            route = route.resolve(&self.settings);
            let next = match self.visit(&route) {
                Ok(Some(next)) => next,
                Ok(None) => break,
                Err(e) if is_end_of_input(&e) => break,
                Err(e) => {
                    tracing::error!("{} failed: {}", route, e);
                    Notice::from_error(&e).show();
                    Route::Home
                }
            };
            route = next;
        }

        println!("\n안녕! 다음에 또 만나요.");
        Ok(())
    }

    fn print_help(&self) {
        println!();
        println!("Commands:");
        println!("  test                 - 문해력 테스트");
        println!("  level <name>         - 난이도 직접 선택 (beginner / intermediate / advanced)");
        println!("  menu                 - 메인 메뉴");
        println!("  play <theme>         - 주제 게임 (school, playground, ...)");
        println!("  missions             - 비밀 미션 목록");
        println!("  custom <theme name>  - 비밀 미션 게임");
        println!("  author <description> - 비밀 미션 만들기");
        println!("  review               - 오답 노트");
        println!("  quiz <theme> [하|중|상|혼합] [count] [seed]");
        println!("  go <path>            - 경로로 이동");
        println!("  quit / q             - 종료");
        if self.client.is_none() {
            println!("  (offline: 비밀 미션 만들기는 사용할 수 없어요)");
        }
    }

    /// Show one screen; `None` quits
    fn visit(&mut self, route: &Route) -> Result<Option<Route>> {
        match route {
            Route::Home => self.home(),
            Route::LiteracyTest => self.literacy_test().map(Some),
            Route::DifficultySettings => self.difficulty_settings().map(|_| Some(Route::MainMenu)),
            Route::MainMenu => {
                let level = self.settings.level_or_default();
                println!("\n메인 메뉴 (현재 난이도: {})", level);
                Ok(Some(Route::Home))
            }
            Route::MainGame => {
                println!();
                for theme in MAIN_THEMES {
                    println!("  {:<11} {} - {}", theme.key, theme.label, theme.blurb);
                }
                Ok(Some(Route::Home))
            }
            Route::Game { theme } => self.play(Category::Main, theme).map(Some),
            Route::AddScenario => {
                let description = prompt("어떤 상황이 고민인가요? ")?;
                self.author(&description).map(|_| Some(Route::SecretMissions))
            }
            Route::SecretMissions => self.missions().map(|_| Some(Route::Home)),
            Route::CustomGame { theme_name } => self.play(Category::Custom, theme_name).map(Some),
            Route::WrongAnswers => self.review().map(|_| Some(Route::Home)),
            Route::NotFound(path) => {
                println!("'{}' 페이지를 찾을 수 없어요.", path);
                Ok(Some(Route::Home))
            }
        }
    }

    fn home(&mut self) -> Result<Option<Route>> {
        let input = prompt("\n> ")?;
        let (command, rest) = match input.split_once(' ') {
            Some((c, r)) => (c, r.trim()),
            None => (input.as_str(), ""),
        };

        let next = match command {
            "" => Route::Home,
            "quit" | "q" => return Ok(None),
            "help" | "h" => {
                self.print_help();
                Route::Home
            }
            "test" => Route::LiteracyTest,
            "level" => {
                let level: Level = rest.parse().map_err(QuestError::InvalidInput)?;
                self.settings.record_level(level)?;
                println!("난이도를 {}(으)로 정했어요.", level);
                Route::MainMenu
            }
            "settings" => Route::DifficultySettings,
            "menu" => Route::MainMenu,
            "themes" => Route::MainGame,
            "play" => Route::Game { theme: rest.to_string() },
            "missions" => Route::SecretMissions,
            "custom" => Route::CustomGame { theme_name: rest.to_string() },
            "author" => {
                self.author(rest)?;
                Route::SecretMissions
            }
            "review" => Route::WrongAnswers,
            "quiz" => {
                self.quiz(rest)?;
                Route::Home
            }
            "go" => Route::parse(rest),
            other => {
                println!("알 수 없는 명령이에요: {} (help 로 목록 보기)", other);
                Route::Home
            }
        };
        Ok(Some(next))
    }

    /// Run the pretest; quitting part way leaves the level untouched
    fn literacy_test(&mut self) -> Result<Route> {
        let (questions, source) = self.rt.block_on(load_questions(
            self.client.as_ref(),
            &mut self.cache,
            &self.config,
        ));
        if source == QuestionSource::Fallback && self.client.is_some() {
            Notice {
                title: "문제를 새로 만들지 못했어요",
                message: "기본 문제로 테스트를 진행해요.".into(),
            }
            .show();
        }

        let mut pretest = Pretest::new(questions);
        while let Some(question) = pretest.current() {
            println!();
            println!("문제 {}. {}", pretest.position() + 1, question.question);
            for (i, option) in question.options.iter().enumerate() {
                println!("  {}. {}", i + 1, option);
            }
            let len = question.options.len();
            let input = prompt("답 (q: 나가기): ")?;
            if input == "q" {
                println!("테스트를 그만뒀어요. 언제든 다시 할 수 있어요.");
                return Ok(Route::Home);
            }
            match parse_choice(&input, len) {
                Some(choice) => pretest.answer(choice)?,
                None => println!("1부터 {} 사이의 번호를 골라 주세요.", len),
            }
        }

        let level = pretest.finish(&mut self.settings)?;
        println!("\n테스트 끝! 난이도: {}", level);
        Ok(Route::MainMenu)
    }

    fn difficulty_settings(&mut self) -> Result<()> {
        for (i, level) in Level::ALL.iter().enumerate() {
            println!("  {}. {}", i + 1, level);
        }
        if let Some(choice) = parse_choice(&prompt("난이도: ")?, Level::ALL.len()) {
            self.settings.record_level(Level::ALL[choice])?;
        }
        Ok(())
    }

    fn load_set(&mut self, category: Category, theme: &str) -> Result<Vec<ScenarioWithOptions>> {
        let level = self.settings.level_or_default();
        let mut rng = rand::thread_rng();
        match (&self.client, self.delegated_rewrite) {
            (Some(client), true) => self.rt.block_on(scenarios::load_delegated(
                client,
                &self.store,
                theme,
                category,
                level,
                &self.config,
                &mut rng,
            )),
            _ => scenarios::load(
                &self.store,
                &self.rules,
                theme,
                category,
                level,
                &self.config,
                &mut rng,
            ),
        }
    }

    fn play(&mut self, category: Category, theme: &str) -> Result<Route> {
        if theme.trim().is_empty() {
            return Err(QuestError::InvalidInput("주제를 골라 주세요".into()));
        }
        let set = self.load_set(category, theme)?;
        let mut play = PlaySession::new(category, theme, set);
        if play.is_empty() {
            println!("'{}' 주제에는 아직 문제가 없어요.", theme);
            return Ok(play.destination());
        }

        while let Some(scenario) = play.current() {
            println!("\n[{}/{}]", play.position() + 1, play.len());
            print_scenario(scenario);
            let len = scenario.options.len();
            let input = prompt("답 (q: 나가기): ")?;
            if input == "q" {
                return Ok(play.destination());
            }
            let Some(choice) = parse_choice(&input, len) else {
                println!("1부터 {} 사이의 번호를 골라 주세요.", len);
                continue;
            };
            let outcome = play.answer(&self.store, &self.session, choice)?;
            if outcome.correct {
                println!("정답이에요!");
            } else {
                println!("다시 생각해 볼까요?");
            }
        }

        println!("\n모든 문제를 풀었어요!");
        Ok(play.destination())
    }

    fn missions(&mut self) -> Result<()> {
        let themes = scenarios::custom_themes(&self.store)?;
        if themes.is_empty() {
            println!("아직 비밀 미션이 없어요. 'author <고민>'으로 만들어 보세요.");
        }
        for summary in themes {
            println!(
                "  {} ({}문제) - {}  {}",
                summary.theme.theme_name,
                summary.scenario_count,
                summary.theme.description,
                Route::CustomGame { theme_name: summary.theme.theme_name.clone() }
            );
        }
        Ok(())
    }

    fn author(&mut self, description: &str) -> Result<()> {
        let Some(client) = &self.client else {
            Notice {
                title: "오프라인",
                message: "비밀 미션을 만들려면 생성 서비스가 필요해요.".into(),
            }
            .show();
            return Ok(());
        };
        println!("비밀 미션을 만들고 있어요...");
        let authored = self.rt.block_on(author_custom_theme(
            client,
            &self.store,
            description,
            &self.config,
        ))?;
        println!("'{}' 미션에 {}문제를 만들었어요.", authored.theme.theme_name, authored.count);
        Ok(())
    }

    fn review(&mut self) -> Result<()> {
        let level = self.settings.level_or_default();
        let mut review = ReviewSession::new(self.config.review_mastery_threshold);

        loop {
            let entries = list_wrong_answers(&self.store, &self.rules, level)?;
            if entries.is_empty() {
                println!("오답 노트가 비어 있어요.");
                return Ok(());
            }
            println!();
            for (i, entry) in entries.iter().enumerate() {
                println!(
                    "  {}. {} (맞힌 횟수 {}/{})",
                    i + 1,
                    entry.scenario.scenario.title,
                    entry.entry.correct_count,
                    self.config.review_mastery_threshold
                );
            }

            let input = prompt("번호 (d 번호: 지우기, q: 나가기): ")?;
            if input == "q" {
                return Ok(());
            }
            if let Some(rest) = input.strip_prefix("d ") {
                if let Some(i) = parse_choice(rest.trim(), entries.len()) {
                    remove_wrong_answer(&self.store, entries[i].entry.id)?;
                    println!("오답 노트에서 지웠어요.");
                }
                continue;
            }
            let Some(i) = parse_choice(&input, entries.len()) else {
                continue;
            };

            let mut entries = entries;
            review.start(entries.swap_remove(i))?;
            self.review_one(&mut review)?;
        }
    }

    fn review_one(&mut self, review: &mut ReviewSession) -> Result<()> {
        loop {
            let Some(entry) = review.entry() else {
                return Ok(());
            };
            print_scenario(&entry.scenario);
            let len = entry.scenario.options.len();
            let input = prompt("답 (q: 목록으로): ")?;
            if input == "q" {
                review.cancel();
                return Ok(());
            }
            let Some(choice) = parse_choice(&input, len) else {
                continue;
            };

            if review.select(choice)? {
                match review.complete(&self.store)? {
                    ReviewFeedback::Remaining(n) => println!("정답! {}번 더 맞히면 오답 노트에서 빠져요.", n),
                    ReviewFeedback::Mastered => println!("완벽해요! 오답 노트에서 졸업했어요."),
                }
                return Ok(());
            }
            println!("아쉬워요. 다시 골라 볼까요?");
            review.retry()?;
        }
    }

    fn quiz(&mut self, args: &str) -> Result<()> {
        let mut parts = args.split_whitespace();
        let mut request = QuizRequest {
            theme: parts.next().unwrap_or_default().to_string(),
            ..Default::default()
        };
        if let Some(d) = parts.next() {
            request.difficulty = d.parse::<Difficulty>().map_err(QuestError::InvalidInput)?;
        }
        if let Some(c) = parts.next() {
            let count = c
                .parse::<u32>()
                .map_err(|e| QuestError::InvalidInput(format!("count '{}': {}", c, e)))?;
            request.count = Some(count);
        }
        if let Some(s) = parts.next() {
            request.seed = s.to_string();
        }

        let (set, questions) = get_or_create(&self.store, &request, &self.config)?;
        println!(
            "\n퀴즈 세트 {} ({}, {}, {}문제, seed {})",
            set.id, set.key.theme, set.key.difficulty, set.key.count, set.key.seed
        );
        if questions.is_empty() {
            println!("문제를 저장하지 못했어요. 같은 명령으로 다시 시도해 주세요.");
        }
        for q in &questions {
            println!("{:>2}. {} - {}", q.idx + 1, q.title, q.situation);
            println!("    규칙: {}", q.rule_note);
        }
        Ok(())
    }
}
