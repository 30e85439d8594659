//! Sinatra staging plugin
//!
//! Sinatra apps have no standard startup file, so the main file is found by
//! looking for a root-level `.rb` file that requires sinatra.

use super::entry_point::EntryPattern;
use super::framework::{AppContext, FrameworkPlugin, LegacyFramework};
use crate::staging::{EnvironmentVars, RuntimeInfo};

pub type SinatraPlugin = FrameworkPlugin<Sinatra>;

const DEFAULT_RUBY: &str = "ruby";
const GEMFILE: &str = "Gemfile";

pub struct Sinatra;

impl Sinatra {
    fn uses_bundler(app: &AppContext<'_>) -> bool {
        app.has_file(GEMFILE)
    }
}

impl LegacyFramework for Sinatra {
    fn name(&self) -> &'static str {
        "Sinatra"
    }

    fn entry_patterns(&self) -> Vec<EntryPattern> {
        vec![EntryPattern::new("*.rb").with_content(r#"\s*require[\s(]*['"]sinatra(/base)?['"]"#)]
    }

    fn start_command(&self, app: &AppContext<'_>, entry_point: &str) -> String {
        let ruby = app.request.runtime.executable_or(DEFAULT_RUBY);
        if Self::uses_bundler(app) {
            format!(
                "{ruby} ./rubygems/ruby/{lib}/bin/bundle exec {ruby} ./{main} $@",
                ruby = ruby,
                lib = library_version(&app.request.runtime),
                main = entry_point
            )
        } else {
            format!("{} {} $@", ruby, entry_point)
        }
    }

    fn environment(&self, app: &AppContext<'_>) -> EnvironmentVars {
        let mut vars = EnvironmentVars::new();
        if Self::uses_bundler(app) {
            let gems = format!(
                "$PWD/app/rubygems/ruby/{}",
                library_version(&app.request.runtime)
            );
            vars.set("PATH", format!("{}/bin:$PATH", gems))
                .set("GEM_PATH", gems.clone())
                .set("GEM_HOME", gems)
                .set("RUBYOPT", "-I$PWD/ruby -rstdsync");
        } else {
            vars.set("RUBYOPT", "-rubygems -I$PWD/ruby -rstdsync");
        }
        vars.set("RACK_ENV", "${RACK_ENV:-production}");
        vars
    }

    fn pre_launch(&self, _app: &AppContext<'_>) -> Option<String> {
        Some(r#"mkdir ruby
echo "\$stdout.sync = true" >> ./ruby/stdsync.rb"#
            .to_string())
    }
}

/// Ruby's library directory version for a runtime.
///
/// 1.8 and 1.9 keep their historical names (`1.8`, `1.9.1`); later releases
/// use `<major>.<minor>.0`.
pub fn library_version(runtime: &RuntimeInfo) -> String {
    let from_version = runtime
        .version
        .split('.')
        .take(2)
        .map(str::to_string)
        .collect::<Vec<_>>();

    let (major, minor) = match from_version.as_slice() {
        [major, minor] if !major.is_empty() && !minor.is_empty() => (major.clone(), minor.clone()),
        _ => {
            let digits: Vec<char> = runtime.name.chars().filter(char::is_ascii_digit).collect();
            match digits.as_slice() {
                [major, minor, ..] => (major.to_string(), minor.to_string()),
                _ => return "1.9.1".to_string(),
            }
        }
    };

    match (major.as_str(), minor.as_str()) {
        ("1", "8") => "1.8".to_string(),
        ("1", "9") => "1.9.1".to_string(),
        _ => format!("{}.{}.0", major, minor),
    }
}
