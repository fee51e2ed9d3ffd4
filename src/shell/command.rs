use crate::fs::{config::MAP_ROW_WIDTH, error::Result, FileSystem};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Write(String, String),
    Append(String, String),
    Cat(String),
    Rm(String),
    Ls,
    Defrag,
    Map,
    Strategy(String),
    Info,
    Exit,
}

/// shell 补全用的命令名
pub const COMMAND_NAMES: [&str; 12] = [
    "write", "append", "cat", "rm", "ls", "defrag", "map", "strategy", "info", "help", "exit",
    "quit",
];

impl Command {
    /// 执行后需要把快照写回磁盘
    pub fn is_mutating(&self) -> bool {
        matches!(
            self,
            Command::Write(..)
                | Command::Append(..)
                | Command::Rm(_)
                | Command::Defrag
                | Command::Strategy(_)
        )
    }
}

/// 执行一条命令，返回要显示的文本
pub fn execute_command(fs: &mut FileSystem, cmd: &Command) -> Result<String> {
    let output = match cmd {
        Command::Help => help_text().to_string(),
        Command::Write(path, content) => {
            let written = fs.write(path, content)?;
            format!("✅ Wrote {} bytes to {}", written, path)
        }
        Command::Append(path, content) => {
            fs.append(path, content)?;
            format!("✅ Appended to {}", path)
        }
        Command::Cat(path) => {
            let text = fs.read(path)?;
            if text.is_empty() {
                "(empty file)".to_string()
            } else {
                text
            }
        }
        Command::Rm(path) => {
            fs.delete(path)?;
            format!("🗑️ Deleted {}", path)
        }
        Command::Ls => {
            let rows = fs.list();
            if rows.is_empty() {
                "(no files)".to_string()
            } else {
                rows.iter()
                    .map(|r| {
                        format!(
                            "{:<20} {:>3} blocks {:>5} bytes {}",
                            r.path, r.blocks, r.size, r.layout
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            }
        }
        Command::Defrag => {
            let report = fs.defragment()?;
            format!(
                "✨ Defragmentation complete. {} files, {} blocks in use, {} blocks moved.",
                report.files, report.blocks_used, report.relocated
            )
        }
        Command::Map => render_map(&fs.block_map()),
        Command::Strategy(name) => {
            let strategy = fs.set_strategy(name)?;
            format!("✅ Changed strategy to {}", strategy)
        }
        Command::Info => serde_json::to_string_pretty(&fs.info())?,
        Command::Exit => String::new(),
    };
    Ok(output)
}

/// 位图按固定宽度分行：1 为已用，0 为空闲
pub fn render_map(used: &[bool]) -> String {
    used.chunks(MAP_ROW_WIDTH)
        .map(|row| row.iter().map(|&u| if u { '1' } else { '0' }).collect::<String>())
        .collect::<Vec<_>>()
        .join("\n")
}

fn help_text() -> &'static str {
    "📘 MiniVFS Commands
  write <path> <content>    Create/overwrite file with content
  append <path> <content>   Append content to file
  cat <path>                View file contents
  rm <path>                 Delete file
  ls                        List all files
  defrag                    Defragment disk
  map                       Show block usage
  strategy <name>           Change allocation strategy (bitmap, first_fit, best_fit)
  info                      Show disk info
  help                      Show this help
  exit / quit               Save and exit"
}
