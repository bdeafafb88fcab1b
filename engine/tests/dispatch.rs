use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use command_grammar::{
    DispatchError, DispatchOutcome, Engine, ExecutionGate, MatchKind, ResolutionError, Trailing,
    TypeResolver,
};
use command_grammar_core::{
    Arguments, Attachment, Command, CommandSource, ExecutionContext, FlagData, Parameter,
    ParameterKind, RegistrationError, SimpleSource, Usage, Value, ValueType,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

type Log = Arc<Mutex<Vec<(String, Arguments)>>>;

fn tokens(raw: &[&str]) -> Vec<String> {
    raw.iter().map(|s| s.to_string()).collect()
}

fn recorder(log: &Log, tag: &str) -> impl Fn(&ExecutionContext<'_>) -> anyhow::Result<()> + use<> {
    let log = Arc::clone(log);
    let tag = tag.to_string();
    move |ctx: &ExecutionContext<'_>| {
        log.lock().unwrap().push((tag.clone(), ctx.arguments.clone()));
        Ok(())
    }
}

fn ban(log: &Log) -> Command {
    Command::new("ban")
        .with_alias("b")
        .with_usage(
            Usage::parse("<player> [-silent|s] <time:duration> <reason...>")
                .unwrap()
                .with_handler(recorder(log, "ban")),
        )
        .with_free_flag(
            FlagData::valued("server", ValueType::Choice(vec!["lobby".into(), "survival".into()]))
                .with_default("lobby"),
        )
}

fn group(log: &Log) -> Command {
    Command::new("group")
        .with_usage(Usage::parse("<group>").unwrap().with_handler(recorder(log, "group")))
        .with_subcommand(
            Command::new("member").with_subcommand(
                Command::new("setperm")
                    .with_usage(
                        Usage::parse("<permission>")
                            .unwrap()
                            .with_handler(recorder(log, "member setperm")),
                    )
                    .with_default_handler(recorder(log, "member setperm default")),
            ),
        )
        .with_subcommand(
            Command::new("setperm").attached(Attachment::Main).with_usage(
                Usage::parse("<permission> [value:boolean=true]")
                    .unwrap()
                    .with_handler(recorder(log, "setperm")),
            ),
        )
}

fn engine_with(commands: Vec<Command>) -> Engine {
    let mut engine = Engine::new();
    for command in commands {
        engine.register(command).unwrap();
    }
    engine
}

fn last(log: &Log) -> (String, Arguments) {
    log.lock().unwrap().last().cloned().unwrap()
}

fn sample_token(p: &Parameter) -> Option<String> {
    let token = match &p.kind {
        ParameterKind::Flag(_) => return None,
        ParameterKind::Literal { .. } => p.name.clone(),
        ParameterKind::Greedy { .. } => "some text".into(),
        ParameterKind::Required(vt) | ParameterKind::Optional { value_type: vt, .. } => match vt {
            ValueType::Integer => "3".into(),
            ValueType::Float => "2.5".into(),
            ValueType::Boolean => "true".into(),
            ValueType::Duration => "1d".into(),
            ValueType::Choice(words) => words[0].clone(),
            _ => "sample".into(),
        },
    };
    Some(token)
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

#[test]
fn test_backfill_assigns_required_parameters() {
    let log = Log::default();
    let engine = engine_with(vec![Command::new("bf").with_usage(
        Usage::parse("<r1> [o1] <r2> [o2]")
            .unwrap()
            .with_handler(recorder(&log, "bf")),
    )]);

    let outcome = engine
        .dispatch(&SimpleSource::console(), "bf", &tokens(&["a", "b"]))
        .unwrap();
    assert_eq!(outcome.kind(), MatchKind::Complete);

    let (_, args) = last(&log);
    assert_eq!(args.text("r1"), Some("a"));
    assert_eq!(args.text("r2"), Some("b"));
    assert!(!args.contains("o1"));
    assert!(!args.contains("o2"));
}

#[test]
fn test_greedy_joins_remaining_tokens() {
    let log = Log::default();
    let engine = engine_with(vec![Command::new("msg").with_usage(
        Usage::parse("<player> <text...>")
            .unwrap()
            .with_handler(recorder(&log, "msg")),
    )]);

    engine
        .dispatch(&SimpleSource::console(), "msg", &tokens(&["bob", "hello", "world"]))
        .unwrap();
    assert_eq!(last(&log).1.text("text"), Some("hello world"));
}

fn say(log: &Log) -> Command {
    Command::new("say").with_usage(
        Usage::parse("[times:integer=1] <msg...>")
            .unwrap()
            .with_handler(recorder(log, "say")),
    )
}

#[test]
fn test_optional_before_greedy_single_token() {
    let log = Log::default();
    let engine = engine_with(vec![say(&log)]);
    let source = SimpleSource::console();

    let outcome = engine.dispatch(&source, "say", &tokens(&["hi"])).unwrap();
    assert_eq!(outcome.kind(), MatchKind::Complete);
    let (tag, args) = last(&log);
    assert_eq!(tag, "say");
    assert_eq!(args.integer("times"), Some(1));
    assert_eq!(args.text("msg"), Some("hi"));

    engine.dispatch(&source, "say", &tokens(&["3"])).unwrap();
    let args = last(&log).1;
    assert_eq!(args.integer("times"), Some(1));
    assert_eq!(args.text("msg"), Some("3"));
}

#[test]
fn test_optional_before_greedy_two_tokens() {
    let log = Log::default();
    let engine = engine_with(vec![say(&log)]);
    let source = SimpleSource::console();

    engine.dispatch(&source, "say", &tokens(&["3", "hi"])).unwrap();
    let args = last(&log).1;
    assert_eq!(args.integer("times"), Some(3));
    assert_eq!(args.text("msg"), Some("hi"));

    engine
        .dispatch(&source, "say", &tokens(&["2", "hello", "there"]))
        .unwrap();
    let args = last(&log).1;
    assert_eq!(args.integer("times"), Some(2));
    assert_eq!(args.text("msg"), Some("hello there"));
}

#[test]
fn test_greedy_without_tokens_is_missing() {
    let log = Log::default();
    let engine = engine_with(vec![Command::new("shout").with_usage(
        Usage::parse("<msg...>")
            .unwrap()
            .with_handler(recorder(&log, "shout")),
    )]);
    let source = SimpleSource::console();

    // Nothing typed falls back to the root default usage.
    let traversal = engine.traverse("shout", &[]).unwrap();
    assert_eq!(traversal.kind, MatchKind::Complete);
    assert!(traversal.usage.unwrap().is_empty());
    engine.dispatch(&source, "shout", &[]).unwrap();
    assert!(log.lock().unwrap().is_empty());

    let shout = engine.command("shout").unwrap();
    let usage = &shout.usages[0];
    let err = engine
        .matcher()
        .resolve(&source, shout, usage, &[], Trailing::Reject)
        .unwrap_err();
    assert_eq!(err, ResolutionError::MissingRequiredArgument("msg".into()));
}

#[test]
fn test_flag_position_is_irrelevant() {
    let log = Log::default();
    let engine = engine_with(vec![ban(&log)]);
    let source = SimpleSource::console();

    engine
        .dispatch(&source, "ban", &tokens(&["mqzen", "-s", "1d", "reason", "text"]))
        .unwrap();
    let front = last(&log).1;
    engine
        .dispatch(&source, "ban", &tokens(&["mqzen", "1d", "reason", "text", "-s"]))
        .unwrap();
    let back = last(&log).1;

    assert_eq!(front, back);
    assert!(front.switch("silent"));
    assert_eq!(front.duration("time"), Some(chrono::TimeDelta::days(1)));
    assert_eq!(front.text("reason"), Some("reason text"));
    assert_eq!(front.text("server"), Some("lobby"));
}

#[test]
fn test_free_flag_value_and_alias_label() {
    let log = Log::default();
    let engine = engine_with(vec![ban(&log)]);

    let outcome = engine
        .dispatch(
            &SimpleSource::console(),
            "B",
            &tokens(&["mqzen", "--server", "SURVIVAL", "2h", "spam"]),
        )
        .unwrap();
    assert_eq!(outcome.invocation().unwrap().label(), "B");
    assert_eq!(last(&log).1.text("server"), Some("survival"));
}

#[test]
fn test_resolution_errors_surface() {
    let log = Log::default();
    let engine = engine_with(vec![ban(&log)]);
    let source = SimpleSource::console();

    let err = engine
        .dispatch(&source, "ban", &tokens(&["mqzen", "1d", "x", "-server"]))
        .unwrap_err();
    assert!(matches!(
        err,
        DispatchError::Resolution(ResolutionError::MissingFlagValue(ref f)) if f == "server"
    ));

    let err = engine
        .dispatch(&source, "ban", &tokens(&["mqzen", "1d", "x", "-server", "moon"]))
        .unwrap_err();
    assert!(matches!(
        err,
        DispatchError::Resolution(ResolutionError::TypeConversion { .. })
    ));
    assert!(log.lock().unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Traversal
// ---------------------------------------------------------------------------

#[test]
fn test_incomplete_runs_default_usage() {
    let log = Log::default();
    let engine = engine_with(vec![group(&log)]);

    let outcome = engine
        .dispatch(&SimpleSource::console(), "group", &tokens(&["member", "setperm"]))
        .unwrap();
    assert_eq!(outcome.kind(), MatchKind::Incomplete);
    assert_eq!(
        outcome.invocation().unwrap().path(),
        ["group", "member", "setperm"]
    );
    assert_eq!(last(&log).0, "member setperm default");
}

#[test]
fn test_subcommand_paths() {
    let log = Log::default();
    let engine = engine_with(vec![group(&log)]);
    let source = SimpleSource::console();

    engine
        .dispatch(&source, "group", &tokens(&["member", "setperm", "fly"]))
        .unwrap();
    let (tag, args) = last(&log);
    assert_eq!(tag, "member setperm");
    assert_eq!(args.text("permission"), Some("fly"));

    engine
        .dispatch(&source, "group", &tokens(&["admins", "setperm", "fly", "off"]))
        .unwrap();
    let (tag, args) = last(&log);
    assert_eq!(tag, "setperm");
    assert_eq!(args.text("group"), Some("admins"));
    assert_eq!(args.boolean("value"), Some(false));

    engine
        .dispatch(&source, "group", &tokens(&["admins", "setperm", "fly"]))
        .unwrap();
    assert_eq!(last(&log).1.boolean("value"), Some(true));

    let mut expected = Arguments::new();
    expected.insert("group", Value::from("admins"));
    engine.dispatch(&source, "group", &tokens(&["admins"])).unwrap();
    assert_eq!(last(&log), ("group".to_string(), expected));
}

#[test]
fn test_failure_reports_usages() {
    let log = Log::default();
    let engine = engine_with(vec![ban(&log)]);

    let outcome = engine
        .dispatch(&SimpleSource::console(), "ban", &tokens(&["mqzen"]))
        .unwrap();
    let DispatchOutcome::Failure(failure) = outcome else {
        panic!("expected failure");
    };
    assert_eq!(failure.command, "ban");
    assert_eq!(failure.last_matched.as_deref(), Some("player"));
    assert_eq!(
        failure.usages,
        vec!["ban <player> [-silent|s] <time:duration> <reason...>"]
    );
    assert!(log.lock().unwrap().is_empty());
}

#[test]
fn test_usage_lines_show_descriptions() {
    let engine = engine_with(vec![
        Command::new("mail")
            .with_usage(
                Usage::parse("send <to> <body...>")
                    .unwrap()
                    .with_description("send a letter"),
            )
            .with_usage(Usage::parse("clear").unwrap()),
    ]);

    assert_eq!(
        engine.usages("mail"),
        vec!["mail send <to> <body...>  # send a letter", "mail clear"]
    );
}

#[test]
fn test_formatted_usages_parse_back_complete() {
    let engine = engine_with(vec![
        Command::new("mail")
            .with_usage(Usage::parse("send <to> <body...>").unwrap())
            .with_usage(Usage::parse("read [index:integer=1]").unwrap())
            .with_usage(Usage::parse("clear [-all|a]").unwrap())
            .with_usage(Usage::parse("<to:word> <mode:{fast,safe}>").unwrap()),
    ]);
    let mail = engine.command("mail").unwrap();

    for effective in mail.effective_usages() {
        let reparsed = Usage::parse(&effective.usage.syntax()).unwrap();
        let input: Vec<String> = reparsed.parameters().iter().filter_map(sample_token).collect();

        let traversal = engine.traverse("mail", &input).unwrap();
        assert_eq!(traversal.kind, MatchKind::Complete, "{input:?}");
        assert_eq!(
            traversal.usage.unwrap().syntax(),
            effective.usage.syntax(),
            "{input:?}"
        );
    }
}

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

#[test]
fn test_ambiguous_usages_rejected() {
    let mut engine = Engine::new();
    let err = engine
        .register(
            Command::new("x")
                .with_usage(Usage::parse("<a:integer>").unwrap())
                .with_usage(Usage::parse("<b:float>").unwrap()),
        )
        .unwrap_err();
    assert!(matches!(err, RegistrationError::AmbiguousUsages { .. }));
    assert!(engine.command("x").is_none());

    engine
        .register(
            Command::new("x")
                .with_usage(Usage::parse("<a:integer>").unwrap())
                .with_usage(Usage::parse("<b:boolean>").unwrap()),
        )
        .unwrap();
}

#[test]
fn test_duplicate_labels_rejected() {
    let log = Log::default();
    let mut engine = engine_with(vec![ban(&log)]);
    let err = engine.register(Command::new("other").with_alias("BAN")).unwrap_err();
    assert_eq!(err, RegistrationError::DuplicateCommand("BAN".into()));
    assert!(engine.command("other").is_none());
}

// ---------------------------------------------------------------------------
// Permissions, gate, handlers
// ---------------------------------------------------------------------------

#[test]
fn test_permissions_along_path() {
    let engine = engine_with(vec![
        Command::new("admin")
            .with_permission("admin.use")
            .with_usage(Usage::parse("reload").unwrap().with_permission("admin.reload")),
    ]);
    let input = tokens(&["reload"]);

    let err = engine
        .dispatch(&SimpleSource::new("bob"), "admin", &input)
        .unwrap_err();
    assert!(matches!(err, DispatchError::PermissionDenied(ref p) if p == "admin.use"));

    let bob = SimpleSource::new("bob").with_permission("admin.use");
    let err = engine.dispatch(&bob, "admin", &input).unwrap_err();
    assert!(matches!(err, DispatchError::PermissionDenied(ref p) if p == "admin.reload"));

    let bob = bob.with_permission("admin.reload");
    assert!(engine.dispatch(&bob, "admin", &input).is_ok());
}

struct Cooldown {
    blocked: bool,
    runs: Arc<AtomicUsize>,
}

impl ExecutionGate for Cooldown {
    fn on_cooldown(&self, _source: &dyn CommandSource, _path: &[String], _usage: &Usage) -> bool {
        self.blocked
    }

    fn record(&self, _source: &dyn CommandSource, _path: &[String], _usage: &Usage) {
        self.runs.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn test_gate_checked_before_resolution() {
    let runs = Arc::new(AtomicUsize::new(0));
    let mut engine = engine_with(vec![
        Command::new("heal").with_usage(Usage::parse("<amount:integer>").unwrap().with_handler(|_| Ok(()))),
    ]);
    engine.set_gate(Cooldown {
        blocked: true,
        runs: Arc::clone(&runs),
    });

    let err = engine
        .dispatch(&SimpleSource::console(), "heal", &tokens(&["5"]))
        .unwrap_err();
    assert!(matches!(err, DispatchError::OnCooldown(ref p) if p == "heal"));

    engine.set_gate(Cooldown {
        blocked: false,
        runs: Arc::clone(&runs),
    });
    engine
        .dispatch(&SimpleSource::console(), "heal", &tokens(&["5"]))
        .unwrap();
    assert_eq!(runs.load(Ordering::SeqCst), 1);
}

#[test]
fn test_prepare_defers_execution() {
    let log = Log::default();
    let engine = engine_with(vec![ban(&log)]);
    let source = SimpleSource::console();

    let outcome = engine
        .prepare(&source, "ban", &tokens(&["mqzen", "1d", "spam"]))
        .unwrap();
    assert!(log.lock().unwrap().is_empty());

    outcome.invocation().unwrap().execute(&source).unwrap();
    assert_eq!(last(&log).1.text("player"), Some("mqzen"));
}

#[test]
fn test_handler_errors_wrapped() {
    let engine = engine_with(vec![Command::new("fail").with_usage(
        Usage::new().with_handler(|_| Err(anyhow::anyhow!("boom"))),
    )]);

    let err = engine
        .dispatch(&SimpleSource::console(), "fail", &[])
        .unwrap_err();
    assert!(matches!(err, DispatchError::HandlerFailed { ref command, .. } if command == "fail"));
    assert!(err.to_string().contains("boom"));
}

#[test]
fn test_unknown_command() {
    let engine = Engine::new();
    let err = engine
        .dispatch(&SimpleSource::console(), "nope", &[])
        .unwrap_err();
    assert!(matches!(err, DispatchError::UnknownCommand(ref c) if c == "nope"));
}

// ---------------------------------------------------------------------------
// Custom types
// ---------------------------------------------------------------------------

struct Color;

impl TypeResolver for Color {
    fn parse(&self, token: &str) -> Result<Value, String> {
        match token {
            "red" | "green" | "blue" => Ok(Value::Text(token.to_string())),
            other => Err(format!("{other} is not a color")),
        }
    }

    fn suggest(&self, _source: &dyn CommandSource, _partial: &str) -> Vec<String> {
        vec!["red".into(), "green".into(), "blue".into()]
    }
}

#[test]
fn test_custom_type_resolution() {
    let log = Log::default();
    let mut engine = engine_with(vec![Command::new("paint").with_usage(
        Usage::parse("<color:color>")
            .unwrap()
            .with_handler(recorder(&log, "paint")),
    )]);
    let source = SimpleSource::console();

    let err = engine.dispatch(&source, "paint", &tokens(&["red"])).unwrap_err();
    assert!(matches!(
        err,
        DispatchError::Resolution(ResolutionError::UnknownType(ref t)) if t == "color"
    ));

    engine.register_type("color", Color);
    engine.dispatch(&source, "paint", &tokens(&["green"])).unwrap();
    assert_eq!(last(&log).1.text("color"), Some("green"));

    let err = engine.dispatch(&source, "paint", &tokens(&["pink"])).unwrap_err();
    assert!(matches!(
        err,
        DispatchError::Resolution(ResolutionError::TypeConversion { .. })
    ));
    assert_eq!(engine.suggest(&source, "paint", &tokens(&["g"])), vec!["green"]);
}
