use crate::config::Args;
use clap::CommandFactory;
use clap_complete::Shell;
use std::process;

pub fn print_config_template() {
    println!("{}", config_template());
    process::exit(0);
}

pub fn print_shell_completions(shell: Shell) -> anyhow::Result<()> {
    println!("{}", shell_completions(shell)?);
    process::exit(0);
}

pub fn print_man_page() -> anyhow::Result<()> {
    println!("{}", man_page()?);
    process::exit(0);
}

const fn config_template() -> &'static str {
    include_str!("../pathtrace-config-sample.toml")
}

fn shell_completions(shell: Shell) -> anyhow::Result<String> {
    let mut cmd = Args::command();
    let name = cmd.get_name().to_string();
    let mut buffer: Vec<u8> = vec![];
    clap_complete::generate(shell, &mut cmd, name, &mut buffer);
    Ok(String::from_utf8(buffer)?)
}

fn man_page() -> anyhow::Result<String> {
    let cmd = Args::command();
    let mut buffer: Vec<u8> = vec![];
    clap_mangen::Man::new(cmd).render(&mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::util::remove_whitespace;
    use test_case::test_case;

    #[test_case(Shell::Bash, "_pathtrace()"; "generate bash shell completions")]
    #[test_case(Shell::Elvish, "edit:completion:arg-completer[pathtrace]"; "generate elvish shell completions")]
    #[test_case(Shell::Fish, "complete-cpathtrace"; "generate fish shell completions")]
    #[test_case(Shell::PowerShell, "Register-ArgumentCompleter-Native-CommandName'pathtrace'"; "generate powershell shell completions")]
    #[test_case(Shell::Zsh, "#compdefpathtrace"; "generate zsh shell completions")]
    fn test_shell_completions(shell: Shell, expected: &str) {
        let completions = remove_whitespace(shell_completions(shell).unwrap());
        assert!(completions.contains(expected));
        assert!(completions.contains("privacy-max-hops"));
    }

    #[test]
    fn test_man_page() {
        let man = man_page().unwrap();
        assert!(man.starts_with(".ie"));
        assert!(man.contains("pathtrace"));
        assert!(man.contains("geoip"));
    }

    #[test]
    fn test_config_template() {
        assert!(config_template().contains("[probe]"));
        assert!(config_template().contains("[geoip]"));
    }
}
