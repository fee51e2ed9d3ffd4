pub mod command;
pub mod parse;

use crate::{
    disk::{
        init::{perform_disk_initialization, recover_from_corruption, BootProgress},
        FileDisk,
    },
    fs::{
        config::DiskConfig,
        error::{FileSystemError, Result},
        FileSystem,
    },
    shell::{
        command::{execute_command, Command, COMMAND_NAMES},
        parse::parse_command,
    },
};
use colored::*;
use crossterm::{
    cursor, execute,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{Clear, ClearType},
};
use dialoguer::Confirm;
use indicatif::{ProgressBar, ProgressStyle};
use reedline::{
    default_emacs_keybindings, ColumnarMenu, DefaultCompleter, DefaultPrompt,
    DefaultPromptSegment, Emacs, FileBackedHistory, KeyCode, KeyModifiers, MenuBuilder, Reedline,
    ReedlineEvent, ReedlineMenu, Signal,
};
use std::{io::stdout, path::PathBuf};
use tracing::warn;

/// 一行命令的执行结果
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LineOutcome {
    pub output: String,
    pub is_error: bool,
    pub exit: bool, // exit / quit
}

impl LineOutcome {
    fn ok(output: String) -> Self {
        Self {
            output,
            ..Self::default()
        }
    }

    fn error(e: &FileSystemError) -> Self {
        let output = match e {
            FileSystemError::InvalidCommand(msg) => msg.clone(),
            other => format!("❌ {}", other),
        };
        Self {
            output,
            is_error: true,
            exit: false,
        }
    }
}

/// 解析并执行一行命令；修改类命令执行后整盘写回快照
///
/// 写入失败时旧块可能已经释放，所以失败的修改命令同样落盘。
pub fn run_line(fs: &mut FileSystem, file_disk: &FileDisk, line: &str) -> LineOutcome {
    let cmd = match parse_command(line) {
        Ok(Some(cmd)) => cmd,
        Ok(None) => return LineOutcome::default(),
        Err(e) => return LineOutcome::error(&e),
    };

    let result = execute_command(fs, &cmd);

    if cmd.is_mutating() || cmd == Command::Exit {
        if let Err(e) = file_disk.save(fs.disk()) {
            return LineOutcome::error(&e);
        }
    }

    match result {
        Ok(_) if cmd == Command::Exit => LineOutcome {
            output: "💾 Disk saved.".to_string(),
            is_error: false,
            exit: true,
        },
        Ok(output) => LineOutcome::ok(output),
        Err(e) => LineOutcome::error(&e),
    }
}

/// 非交互模式：依次执行，遇到 exit 停止；全部成功返回 true
pub fn run_script<I, S>(fs: &mut FileSystem, file_disk: &FileDisk, lines: I) -> bool
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut all_ok = true;
    for line in lines {
        let outcome = run_line(fs, file_disk, line.as_ref());
        print_outcome(&outcome);
        all_ok &= !outcome.is_error;
        if outcome.exit {
            break;
        }
    }
    all_ok
}

fn print_outcome(outcome: &LineOutcome) {
    if outcome.output.is_empty() {
        return;
    }
    if outcome.is_error {
        println!("{}", outcome.output.red());
    } else {
        println!("{}", outcome.output);
    }
}

/// 启动动画 + 挂载磁盘；快照损坏时询问是否从空盘开始
pub fn boot(file_disk: &FileDisk, config: &DiskConfig) -> Result<FileSystem> {
    let mut out = stdout();
    execute!(out, Clear(ClearType::All), cursor::MoveTo(0, 0))?;
    println!("{}", "[MiniVFS Booting...]".bright_yellow().bold());

    let pb = ProgressBar::new(100);
    if let Ok(style) = ProgressStyle::with_template("[{bar:40.cyan/blue}] {pos:>3}% {msg}") {
        pb.set_style(style.progress_chars("=> "));
    }

    let mut on_progress = |progress: BootProgress| match progress {
        BootProgress::Step(step) => pb.println(step),
        BootProgress::Progress(pos) => pb.set_position(pos),
    };
    let mounted = perform_disk_initialization(file_disk, config, &mut on_progress);

    let fs = match mounted {
        Ok(fs) => {
            pb.finish_with_message("✅ Ready!");
            fs
        }
        Err(FileSystemError::CorruptState(reason)) => {
            pb.abandon_with_message("❌ Disk state corrupted");
            println!("{} {}", "❌".red(), reason.red());
            let fresh = Confirm::new()
                .with_prompt("Move the corrupt snapshot aside and start with an empty disk?")
                .default(true)
                .interact()
                .unwrap_or(false);
            if !fresh {
                return Err(FileSystemError::CorruptState(reason));
            }
            let (fs, backup) = recover_from_corruption(file_disk, config)?;
            println!(
                "{} {}",
                "⚠️  Corrupt snapshot kept at".yellow(),
                backup.display()
            );
            fs
        }
        Err(e) => {
            pb.abandon();
            return Err(e);
        }
    };

    execute!(
        out,
        SetForegroundColor(Color::Cyan),
        Print(format!("Welcome to MiniVFS v{}\n", env!("CARGO_PKG_VERSION"))),
        ResetColor
    )?;
    Ok(fs)
}

fn build_line_editor() -> Reedline {
    let mut line_editor = Reedline::create();

    let history_path = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".minivfs_history");
    match FileBackedHistory::with_file(100, history_path) {
        Ok(history) => line_editor = line_editor.with_history(Box::new(history)),
        Err(e) => warn!(error = %e, "command history disabled"),
    }

    // 命令补全
    let completer = DefaultCompleter::new_with_wordlen(
        COMMAND_NAMES.iter().map(|name| name.to_string()).collect(),
        2,
    );
    let completion_menu = ColumnarMenu::default().with_name("completion_menu");
    let mut keybindings = default_emacs_keybindings();
    keybindings.add_binding(
        KeyModifiers::NONE,
        KeyCode::Tab,
        ReedlineEvent::UntilFound(vec![
            ReedlineEvent::Menu("completion_menu".to_string()),
            ReedlineEvent::MenuNext,
        ]),
    );

    line_editor
        .with_completer(Box::new(completer))
        .with_menu(ReedlineMenu::EngineCompleter(Box::new(completion_menu)))
        .with_edit_mode(Box::new(Emacs::new(keybindings)))
}

/// 交互式 shell 主循环
pub fn start_shell(mut fs: FileSystem, file_disk: &FileDisk) {
    let username = whoami::username();
    let hostname = whoami::devicename();

    println!(
        "{}",
        "Type 'help' for available commands. Use ↑↓ for history, Tab for auto-completion.\n"
            .bright_black()
    );

    let mut line_editor = build_line_editor();

    loop {
        let prompt = DefaultPrompt::new(
            DefaultPromptSegment::Basic(format!(
                "{}@{} [{}]",
                username,
                hostname,
                fs.strategy()
            )),
            DefaultPromptSegment::Basic("MiniVFS".to_string()),
        );

        match line_editor.read_line(&prompt) {
            Ok(Signal::Success(buffer)) => {
                let outcome = run_line(&mut fs, file_disk, buffer.trim());
                print_outcome(&outcome);
                if outcome.exit {
                    break;
                }
            }
            Ok(Signal::CtrlC) => {
                println!();
                continue;
            }
            Ok(Signal::CtrlD) => {
                match file_disk.save(fs.disk()) {
                    Ok(()) => println!("{}", "💾 Disk saved. Exiting MiniVFS...".yellow()),
                    Err(e) => println!("{} {}", "❌".red(), e.to_string().red()),
                }
                break;
            }
            #[allow(unreachable_patterns)]
            Ok(_) => continue,
            Err(e) => {
                println!("Error reading line: {}", e);
                break;
            }
        }
    }

    println!("{}", "GoodBye!".bright_yellow());
}
