use schematic::Config;

/// External speech programs.
///
/// `/speak` writes the response text to the stdin of `program`. `/listen`
/// runs `listen_program` and takes what it prints to stdout as the prompt.
#[derive(Debug, Clone, PartialEq, Config)]
#[config(rename_all = "snake_case")]
pub struct SpeechConfig {
    #[setting(default = "espeak")]
    pub program: String,

    #[setting(default = vec![String::from("--stdin"), String::from("-s"), String::from("210")])]
    pub args: Vec<String>,

    /// Speech-to-text program. Voice input is unavailable while unset.
    pub listen_program: Option<String>,

    pub listen_args: Vec<String>,
}
