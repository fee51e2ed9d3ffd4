use crate::{
    fs::error::{FileSystemError, Result},
    shell::command::Command,
};

const UNCLOSED_QUOTE: &str = "❌ Invalid command: No closing quotation";

/// 按 shell 规则切分命令行：ASCII 空白分隔，支持单双引号和反斜杠转义
///
/// 全角空格、不换行空格等属于内容，不作为分隔符。
pub fn tokenize(input: &str) -> Result<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut chars = input.chars();

    while let Some(c) = chars.next() {
        match c {
            ' ' | '\t' | '\r' | '\n' => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            '\'' => {
                in_token = true;
                loop {
                    match chars.next() {
                        Some('\'') => break,
                        Some(c) => current.push(c),
                        None => return Err(invalid(UNCLOSED_QUOTE)),
                    }
                }
            }
            '"' => {
                in_token = true;
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some(c @ ('"' | '\\')) => current.push(c),
                            Some(c) => {
                                current.push('\\');
                                current.push(c);
                            }
                            None => return Err(invalid(UNCLOSED_QUOTE)),
                        },
                        Some(c) => current.push(c),
                        None => return Err(invalid(UNCLOSED_QUOTE)),
                    }
                }
            }
            '\\' => {
                in_token = true;
                match chars.next() {
                    Some(c) => current.push(c),
                    None => return Err(invalid("❌ Invalid command: No escaped character")),
                }
            }
            c => {
                in_token = true;
                current.push(c);
            }
        }
    }
    if in_token {
        tokens.push(current);
    }
    Ok(tokens)
}

/// 解析一行命令；空行返回 `None`
pub fn parse_command(input: &str) -> Result<Option<Command>> {
    let tokens = tokenize(input)?;
    let Some((cmd, args)) = tokens.split_first() else {
        return Ok(None);
    };

    let command = match cmd.to_lowercase().as_str() {
        "help" => Command::Help,
        "ls" => Command::Ls,
        "defrag" => Command::Defrag,
        "map" => Command::Map,
        "info" => Command::Info,
        "exit" | "quit" => Command::Exit,
        "write" => {
            let (path, content) = path_and_content(args, "Usage: write <path> <content>")?;
            Command::Write(path, content)
        }
        "append" => {
            let (path, content) = path_and_content(args, "Usage: append <path> <content>")?;
            Command::Append(path, content)
        }
        "cat" => Command::Cat(single(args, "Usage: cat <path>")?),
        "rm" => Command::Rm(single(args, "Usage: rm <path>")?),
        "strategy" => Command::Strategy(single(
            args,
            "Usage: strategy <bitmap|first_fit|best_fit>",
        )?),
        _ => return Err(invalid("❓ Unknown command. Type 'help'.")),
    };
    Ok(Some(command))
}

fn path_and_content(args: &[String], usage: &str) -> Result<(String, String)> {
    match args {
        [path, rest @ ..] if !rest.is_empty() => Ok((path.clone(), rest.join(" "))),
        _ => Err(invalid(usage)),
    }
}

fn single(args: &[String], usage: &str) -> Result<String> {
    match args {
        [arg] => Ok(arg.clone()),
        _ => Err(invalid(usage)),
    }
}

fn invalid(msg: &str) -> FileSystemError {
    FileSystemError::InvalidCommand(msg.to_string())
}
