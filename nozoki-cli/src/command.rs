//! REPLコマンド

/// REPLコマンド
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// 変数を表示（`raw` ならアダプタを通さない）
    Print { name: String, raw: bool },
    /// 変数の型と対応するアダプタを表示
    Whatis(String),
    /// セッションの変数一覧
    List,
    /// 登録済みのアダプタ一覧
    InfoPrinters,
    /// 冗長表示の切り替え
    SetPretty(bool),
    /// 冗長表示の状態
    ShowPretty,
    /// ヘルプ表示
    Help,
    /// 終了
    Quit,
}

fn parse_switch(word: &str) -> Option<bool> {
    match word {
        "on" | "1" | "yes" | "enable" => Some(true),
        "off" | "0" | "no" | "disable" => Some(false),
        _ => None,
    }
}

impl Command {
    /// コマンド文字列をパースする
    pub fn parse(input: &str) -> Option<Self> {
        let parts: Vec<&str> = input.split_whitespace().collect();
        if parts.is_empty() {
            return None;
        }

        match parts[0] {
            "print" | "p" | "print/r" | "p/r" => {
                if parts.len() > 1 {
                    Some(Command::Print {
                        name: parts[1..].join(" "),
                        raw: parts[0].ends_with("/r"),
                    })
                } else {
                    None
                }
            }
            "whatis" | "ptype" => parts.get(1).map(|name| Command::Whatis(name.to_string())),
            "list" | "ls" => Some(Command::List),
            "info" => match parts.get(1).copied() {
                Some("printers") | Some("pretty-printer") => Some(Command::InfoPrinters),
                Some("locals") | Some("variables") => Some(Command::List),
                _ => None,
            },
            "set" => match parts.get(1..) {
                Some(["print", "pretty"]) => Some(Command::SetPretty(true)),
                Some(["print", "pretty", switch]) => parse_switch(switch).map(Command::SetPretty),
                _ => None,
            },
            "show" => match parts.get(1..) {
                Some(["print", "pretty"]) => Some(Command::ShowPretty),
                _ => None,
            },
            "help" | "h" | "?" => Some(Command::Help),
            "quit" | "q" | "exit" => Some(Command::Quit),
            _ => None,
        }
    }
}
