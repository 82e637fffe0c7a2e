//! Initial filesystem layout.

use jsh_types::config::ShellConfig;
use jsh_types::error::Result;
use jsh_vfs::{MemoryVfs, VPath};

use crate::interpreter::CommandRegistry;

/// Directory holding the native programs.
pub const BIN_DIR: &str = "/usr/bin";

const DEFAULT_RC: &str = "\
#!jsh
# Sourced once at startup. Lines run exactly as if typed at the prompt.
";

/// Build the filesystem a new session starts with.
///
/// Every registered native program gets an executable under [`BIN_DIR`]. The
/// home directory is created along with a startup file, and `/tmp` and `/etc`
/// are provided as scratch space.
pub fn populate_default_vfs(config: &ShellConfig, registry: &CommandRegistry) -> Result<MemoryVfs> {
    let mut vfs = MemoryVfs::new();

    let bin = VPath::new(BIN_DIR);
    vfs.create_dir_all(&bin)?;
    for cmd in registry.commands() {
        vfs.create_exe(&bin, cmd.name(), cmd.name())?;
    }

    for dir in ["/tmp", "/etc"] {
        vfs.create_dir_all(&VPath::new(dir))?;
    }
    vfs.write_file(&VPath::new("/etc/hostname"), &format!("{}\n", config.host), false)?;

    let home = VPath::new(config.home.as_str());
    vfs.create_dir_all(&home)?;
    vfs.write_file(&home.join(&config.rc_file), DEFAULT_RC, true)?;

    Ok(vfs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::register_utilities;

    fn build(config: &ShellConfig) -> MemoryVfs {
        let mut registry = CommandRegistry::new();
        register_utilities(&mut registry);
        populate_default_vfs(config, &registry).unwrap()
    }

    #[test]
    fn utilities_installed_as_executables() {
        let vfs = build(&ShellConfig::default());
        for name in ["ls", "cat", "wrap", "center", "clear"] {
            let node = vfs.locate(&VPath::new(BIN_DIR).join(name)).unwrap();
            assert!(node.is_executable(), "{name} should be executable");
            assert_eq!(node.native(), Some(name));
        }
    }

    #[test]
    fn home_and_rc_file_exist() {
        let vfs = build(&ShellConfig::default());
        assert!(vfs.is_dir(&VPath::new("/home/user")));
        let rc = vfs.locate(&VPath::new("/home/user/.jshrc")).unwrap();
        assert!(rc.is_executable());
        assert!(rc.text().unwrap().starts_with("#!jsh"));
    }

    #[test]
    fn custom_home_is_created() {
        let config = ShellConfig {
            home: "/users/deep/bonny".to_string(),
            ..ShellConfig::default()
        };
        let vfs = build(&config);
        assert!(vfs.is_dir(&VPath::new("/users/deep/bonny")));
    }

    #[test]
    fn home_under_a_program_fails() {
        let config = ShellConfig {
            home: "/usr/bin/ls/home".to_string(),
            ..ShellConfig::default()
        };
        let mut registry = CommandRegistry::new();
        register_utilities(&mut registry);
        assert!(populate_default_vfs(&config, &registry).is_err());
    }
}
