// --- 依存モジュール ---

use crate::domain::intermediate::IntermediateImage;
use crate::domain::workspace::OutputDir;
use crate::error::AppError;
use crate::tee::{run_teed_to, TeeError, TeeLog};
use image::ImageFormat;
use log::{debug, info};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

/// コンテナ内で出力ディレクトリをマウントする位置。
const CONTAINER_WORKDIR: &str = "/work";

pub const DEFAULT_CONTAINER_ENGINE: &str = "docker";
pub const DEFAULT_CONVERTER_IMAGE: &str = "netpbm";
pub const DEFAULT_CONVERTER_TOOL: &str = "pnmtopng";

/// 中間画像（PNM）をPNGに変換する方法。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Converter {
    /// コンテナ内の変換ツールを出力ディレクトリをマウントして実行する。
    Container {
        engine: String,
        image: String,
        tool: String,
    },
    /// ローカルにインストールされた変換コマンドを実行する。
    Local { program: Vec<String> },
    /// `image` クレートで直接デコード・エンコードする。
    Builtin,
}

impl Default for Converter {
    fn default() -> Self {
        Converter::Container {
            engine: DEFAULT_CONTAINER_ENGINE.to_string(),
            image: DEFAULT_CONVERTER_IMAGE.to_string(),
            tool: DEFAULT_CONVERTER_TOOL.to_string(),
        }
    }
}

impl Converter {
    /// ローカル変換コマンドを作成します。空の場合は既定のツール名を使います。
    pub fn local(program: Vec<String>) -> Self {
        if program.is_empty() {
            Converter::Local {
                program: vec![DEFAULT_CONVERTER_TOOL.to_string()],
            }
        } else {
            Converter::Local { program }
        }
    }

    /// 外部コマンドで変換する場合のコマンドライン。`Builtin` では `None`。
    ///
    /// # 引数
    /// * `dir`: 出力ディレクトリ（コンテナにマウントされる絶対パス）。
    /// * `source_name`: 出力ディレクトリ内の変換元ファイル名。
    pub fn argv(&self, dir: &Path, source_name: &str) -> Option<Vec<String>> {
        match self {
            Converter::Container {
                engine,
                image,
                tool,
            } => Some(vec![
                engine.clone(),
                "run".to_string(),
                "--rm".to_string(),
                "-i".to_string(),
                "-v".to_string(),
                format!("{}:{}", dir.display(), CONTAINER_WORKDIR),
                "-w".to_string(),
                CONTAINER_WORKDIR.to_string(),
                image.clone(),
                tool.clone(),
                source_name.to_string(),
            ]),
            Converter::Local { program } => {
                let mut argv = program.clone();
                argv.push(source_name.to_string());
                Some(argv)
            }
            Converter::Builtin => None,
        }
    }

    /// `source` を変換し、出力ディレクトリ内に拡張子 `png` のファイルを作成します。
    ///
    /// 外部コマンドの場合、変換先ファイルを先に作成してから標準出力をそこへ書き込みます。
    /// コマンドが失敗すると、空または途中までのファイルが残ります。
    ///
    /// # 戻り値
    /// * `Ok(PathBuf)`: 作成した変換先ファイルのパス。
    /// * `Err(AppError)`: 起動失敗、異常終了、デコード失敗など。
    pub fn convert<W: Write + Send + 'static>(
        &self,
        output_dir: &OutputDir,
        source: &IntermediateImage,
        log: &TeeLog,
        terminal: W,
    ) -> Result<PathBuf, AppError> {
        let destination_name = source.destination_name();
        let destination = output_dir.join(&destination_name);
        info!(
            "{} を {} に変換します",
            source.file_name(),
            destination_name
        );

        // コンテナのボリューム指定には絶対パスが必要
        let dir = fs::canonicalize(output_dir.as_path())?;
        match self.argv(&dir, source.file_name()) {
            Some(argv) => {
                run_converter(&argv, &dir, &destination, log, terminal)?;
            }
            None => {
                let img = image::open(output_dir.join(source.file_name()))?;
                img.save_with_format(&destination, ImageFormat::Png)?;
            }
        }

        debug!("変換が完了しました: {}", destination.display());
        Ok(destination)
    }
}

/// 変換コマンドを出力ディレクトリで実行し、標準出力を `destination` に書き出す。
fn run_converter<W: Write + Send + 'static>(
    argv: &[String],
    dir: &Path,
    destination: &Path,
    log: &TeeLog,
    terminal: W,
) -> Result<(), AppError> {
    let (program, args) = argv
        .split_first()
        .ok_or_else(|| AppError::ConversionSpawn {
            program: String::new(),
            source: std::io::Error::other("変換コマンドが空です"),
        })?;
    debug!("変換コマンド: {}", argv.join(" "));

    let mut command = Command::new(program);
    command.args(args).current_dir(dir);

    let file = File::create(destination)?;
    let status = run_teed_to(command, log, terminal, file).map_err(|e| match e {
        TeeError::Spawn(source) => AppError::ConversionSpawn {
            program: program.clone(),
            source,
        },
        TeeError::Relay(source) => AppError::Io(source),
    })?;

    if !status.success() {
        return Err(AppError::ConversionFailed { status });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use tempfile::tempdir;

    /// 4x3 のバイナリPGMを作成する
    fn write_pgm(path: &Path) {
        let mut bytes = b"P5\n4 3\n255\n".to_vec();
        bytes.extend((0..12u8).map(|i| i * 20));
        fs::write(path, bytes).expect("PGMの書き込みに失敗");
    }

    fn setup() -> (tempfile::TempDir, OutputDir, TeeLog) {
        let dir = tempdir().expect("Failed to create temp directory");
        let output = OutputDir::ensure(dir.path().join("data")).unwrap();
        let log = TeeLog::create(output.join("wave.log")).unwrap();
        (dir, output, log)
    }

    #[test]
    fn container_argv_mounts_output_dir() {
        let argv = Converter::default()
            .argv(Path::new("/srv/data"), "wave-12.pgm")
            .unwrap();
        assert_eq!(
            argv,
            vec![
                "docker",
                "run",
                "--rm",
                "-i",
                "-v",
                "/srv/data:/work",
                "-w",
                "/work",
                "netpbm",
                "pnmtopng",
                "wave-12.pgm"
            ]
        );
    }

    #[test]
    fn local_argv_appends_source() {
        let converter = Converter::local(vec!["pnmtopng".into(), "-compression".into(), "9".into()]);
        assert_eq!(
            converter.argv(Path::new("/d"), "wave-1.pgm").unwrap(),
            vec!["pnmtopng", "-compression", "9", "wave-1.pgm"]
        );
        assert_eq!(
            Converter::local(Vec::new()),
            Converter::Local {
                program: vec!["pnmtopng".to_string()]
            }
        );
        assert_eq!(Converter::Builtin.argv(Path::new("/d"), "x.pgm"), None);
    }

    #[test]
    fn builtin_writes_png_with_same_dimensions() {
        let (_dir, output, log) = setup();
        write_pgm(&output.join("wave-5.pgm"));
        let source = IntermediateImage::parse("wave-5.pgm").unwrap();

        let dest = Converter::Builtin
            .convert(&output, &source, &log, io::sink())
            .expect("builtin conversion should succeed");

        assert_eq!(dest, output.join("wave-5.png"));
        let png = image::open(&dest).expect("PNGとして読み込めるはずです");
        assert_eq!((png.width(), png.height()), (4, 3));
    }

    #[test]
    fn builtin_rejects_broken_source() {
        let (_dir, output, log) = setup();
        fs::write(output.join("wave-1.pgm"), b"not an image").unwrap();
        let source = IntermediateImage::parse("wave-1.pgm").unwrap();

        let err = Converter::Builtin
            .convert(&output, &source, &log, io::sink())
            .unwrap_err();
        assert!(matches!(err, AppError::Image(_)));
    }

    #[cfg(unix)]
    #[test]
    fn local_command_output_goes_to_destination() {
        let (_dir, output, log) = setup();
        write_pgm(&output.join("wave-2.pgm"));
        let source = IntermediateImage::parse("wave-2.pgm").unwrap();
        let converter = Converter::local(vec![
            "sh".into(),
            "-c".into(),
            "cat \"$1\"; echo converted >&2".into(),
            "sh".into(),
        ]);

        let dest = converter
            .convert(&output, &source, &log, io::sink())
            .expect("conversion should succeed");

        assert_eq!(
            fs::read(&dest).unwrap(),
            fs::read(output.join("wave-2.pgm")).unwrap()
        );
        assert!(fs::read_to_string(log.path())
            .unwrap()
            .contains("converted"));
    }

    #[cfg(unix)]
    #[test]
    fn failing_command_leaves_destination_and_reports_status() {
        let (_dir, output, log) = setup();
        write_pgm(&output.join("wave-3.pgm"));
        let source = IntermediateImage::parse("wave-3.pgm").unwrap();
        let converter = Converter::local(vec![
            "sh".into(),
            "-c".into(),
            "echo boom >&2; exit 4".into(),
            "sh".into(),
        ]);

        let err = converter
            .convert(&output, &source, &log, io::sink())
            .unwrap_err();

        assert_eq!(err.exit_code(), 4);
        assert!(matches!(err, AppError::ConversionFailed { .. }));
        // リダイレクト先は先に作られるため空のファイルが残る
        assert_eq!(fs::read(output.join("wave-3.png")).unwrap(), Vec::<u8>::new());
        assert!(fs::read_to_string(log.path()).unwrap().contains("boom"));
    }

    #[test]
    fn missing_converter_is_a_spawn_error() {
        let (_dir, output, log) = setup();
        write_pgm(&output.join("wave-1.pgm"));
        let source = IntermediateImage::parse("wave-1.pgm").unwrap();
        let converter = Converter::local(vec!["wave-runner-no-such-converter".into()]);

        let err = converter
            .convert(&output, &source, &log, io::sink())
            .unwrap_err();
        assert!(matches!(err, AppError::ConversionSpawn { .. }));
    }
}
