#![allow(dead_code)]
use anyhow::Result;
use std::cell::RefCell;
use std::fs;
use std::io::Result as IoResult;
use std::path::PathBuf;
use std::rc::Rc;
use tempfile::{tempdir, TempDir};
use ue_buildlog::prelude::*;

pub const ROOT: &str = r"C:\Work\";

/// A four node BuildGraph run: compile, cook, Gauntlet tests, data validation.
pub const FULL_LOG: &str = r#"****** [1/4] Compile GameEditor Win64
Running: C:\Program Files\dotnet\dotnet.exe "C:\Work\Engine\Binaries\DotNET\UnrealBuildTool\UnrealBuildTool.dll" GameEditor Win64 Development -Project="C:\Work\Game\Game.uproject"
Building 3 actions with 8 processes...
[1/3] Compile Module.Game.cpp
C:\Work\Game\Source\Foo.cpp(10): error C2065: 'x': undeclared identifier
        ^
C:\Work\Game\Source\Bar.cpp(5): warning C4996: 'old': was declared deprecated
C:\Work\Game\Source\Bar.cpp(5): warning C4996: 'old': was declared deprecated
[3/3] Link UnrealEditor-Game.dll
Took 45.2s to run UnrealBuildTool.exe, ExitCode=6
****** [2/4] Cook Game Windows
Running: C:\Work\Engine\Binaries\Win64\UnrealEditor-Cmd.exe C:\Work\Game\Game.uproject -run=Cook -TargetPlatform=Windows
LogCook: Display: Cooked packages 10 Packages Remain 5 Total 15
Running: C:\Work\Engine\Binaries\Win64\ShaderCompileWorker.exe -xge
compiling 12 shaders
Took 3.0s to run ShaderCompileWorker.exe, ExitCode=0
LogBlueprint: Warning: [AssetLog] C:\Work\Game\Content\Hero.uasset: Node is deprecated
LogCook: Display: Cooked packages 15 Packages Remain 0 Total 15
LogCook: Display: Finishing up...
LogCook: Display: Cook Profile
LogCook: Display: ===========
LogCook: Display: 0. Save=10.5
LogCook: Display:    0. Write=6.0
LogCook: Display:    1. Serialize=4.5
LogCook: Display: done
LogCook: Display: Misc Cook Stats
LogCook: Display: ===============
LogCook: Display:     Package
LogCook: Display:         NumPackagesSaved=120
Took 100.0s to run UnrealEditor-Cmd.exe, ExitCode=0
****** [3/4] Run Tests
Running: C:\Program Files\dotnet\dotnet.exe "C:\Work\Engine\Binaries\DotNET\AutomationTool\AutomationTool.dll" RunUnrealTests -Platform=Win64 -Configuration=Development
Test Started. Name={T1} Path={/Game/T1}
Test Completed. Result={Fail} Name={T1} Path={/Game/T1}
LogAutomationController: BeginEvents: /Game/T1
LogTemp: Err0r: it broke
LogAutomationController: EndEvents: /Game/T1
Took 30.0s to run dotnet.exe, ExitCode=1
****** [4/4] Validate Content
Running: C:\Work\Engine\Binaries\Win64\UnrealEditor-Cmd.exe C:\Work\Game\Game.uproject -run=DataValidation
LogContentValidation: Display: Validating /Game/Maps/Arena.Arena ...
LogContentValidation: Display: Validating /Game/Maps/Test.Test ...
AssetCheck: Error: [AssetLog] C:\Work\Game\Content\Maps\Test.umap: Missing player start (MapCheck)
LogInit: Display: Warning/Error Summary (Unique only)
LogInit: Display: Success - 0 error(s), 0 warning(s)
"#;

/// What a [`RecordingSink`] saw, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Recorded {
    Open(String, String),
    Close(String),
    Line(String),
    Warning(Message),
    Error(Message),
    Stat(String, String),
    StartSuite(String),
    FinishSuite(String),
    StartTest(String),
    FinishTest(String),
    FailTest(String, String),
    ValidateFail(Message),
    Finished(i32),
}

/// A sink that keeps every call, shared with the test through an `Rc`.
#[derive(Clone, Default)]
pub struct RecordingSink(pub Rc<RefCell<Vec<Recorded>>>);

impl RecordingSink {
    pub fn events(&self) -> Vec<Recorded> {
        self.0.borrow().clone()
    }

    fn push(&self, event: Recorded) -> Result<()> {
        self.0.borrow_mut().push(event);
        Ok(())
    }
}

impl LogSink for RecordingSink {
    fn process_finished(&mut self, exit_code: i32) -> Result<()> {
        self.push(Recorded::Finished(exit_code))
    }
    fn open_block(&mut self, name: &str, description: &str) -> Result<()> {
        self.push(Recorded::Open(name.into(), description.into()))
    }
    fn close_block(&mut self, name: &str) -> Result<()> {
        self.push(Recorded::Close(name.into()))
    }
    fn message(&mut self, text: &str) -> Result<()> {
        self.push(Recorded::Line(text.into()))
    }
    fn warning(&mut self, message: &Message) -> Result<()> {
        self.push(Recorded::Warning(message.clone()))
    }
    fn error(&mut self, message: &Message) -> Result<()> {
        self.push(Recorded::Error(message.clone()))
    }
    fn stat(&mut self, key: &str, value: &str) -> Result<()> {
        self.push(Recorded::Stat(key.into(), value.into()))
    }
    fn start_test_suite(&mut self, name: &str) -> Result<()> {
        self.push(Recorded::StartSuite(name.into()))
    }
    fn finish_test_suite(&mut self, name: &str) -> Result<()> {
        self.push(Recorded::FinishSuite(name.into()))
    }
    fn start_test(&mut self, name: &str) -> Result<()> {
        self.push(Recorded::StartTest(name.into()))
    }
    fn finish_test(&mut self, name: &str) -> Result<()> {
        self.push(Recorded::FinishTest(name.into()))
    }
    fn fail_test(&mut self, name: &str, message: &str, _details: &str) -> Result<()> {
        self.push(Recorded::FailTest(name.into(), message.into()))
    }
    fn validate_fail(&mut self, message: &Message) -> Result<()> {
        self.push(Recorded::ValidateFail(message.clone()))
    }
}

/// Everything a run produced.
pub struct Run {
    pub build: SharedMessageStore,
    pub assets: SharedMessageStore,
    pub recorder: RecordingSink,
    pub stats: Option<StatStore>,
}

/// Feeds `log` through a listener wired up the way the binary does it,
/// plus a recorder.
pub fn run_log(log: &str, exit_code: i32) -> Result<Run> {
    let build = shared_store(BlockFilter::All);
    let assets = shared_store(BlockFilter::asset_validation());
    let recorder = RecordingSink::default();
    let sinks = SinkFanout::new()
        .with(Box::new(StoreSink::new(build.clone())))
        .with(Box::new(StoreSink::new(assets.clone())))
        .with(Box::new(recorder.clone()));
    let mut listener = LogListenerBuilder::new()
        .with_root_path(ROOT)
        .with_stats(true)
        .build(Box::new(sinks))?;
    listener.process_started("test")?;
    LineFeeder::new().run(log.as_bytes(), &mut listener)?;
    listener.process_finished(exit_code)?;
    Ok(Run {
        build,
        assets,
        recorder,
        stats: listener.into_stats(),
    })
}

/// A temporary directory holding a log file.
pub struct LogFixture {
    pub temp_dir: TempDir,
    pub log: PathBuf,
}

impl LogFixture {
    pub fn new(contents: &str) -> IoResult<Self> {
        let temp_dir = tempdir()?;
        let log = temp_dir.path().join("build.log");
        fs::write(&log, contents)?;
        Ok(LogFixture { temp_dir, log })
    }

    pub fn out_dir(&self) -> PathBuf {
        self.temp_dir.path().join("artifacts")
    }
}
