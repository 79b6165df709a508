use faa2etc::core::etl::save_summary;
use faa2etc::{
    EtlEngine, EtlError, FaaPipeline, LocalStorage, RunConfig, SourceMode, UnresolvedPolicy,
};
use httpmock::prelude::*;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use zip::write::{FileOptions, ZipWriter};

const MASTER: &str = "\
N-NUMBER,SERIAL NUMBER,MFR MDL CODE,ENG MFR MDL,YEAR MFR,TYPE REGISTRANT,NAME,STREET,STREET2,CITY,STATE,ZIP CODE,MODE S CODE,MODE S CODE HEX,
N12345,17255      ,X      ,17003,1998,5,Jane Doe                      ,PO BOX 1 ,        ,Austin   ,TX,78701,50123456,A1B2C3    ,
N6    ,6          ,X      ,17003,2001,6,Acme Flying Club              ,1 MAIN   ,        ,Dallas   ,TX,75201,50123457,A1B2C4    ,
N777  ,777        ,NOPE   ,17003,1977,3,Boeing Co                     ,7 WAY    ,        ,Seattle  ,WA,98101,50123458,A1B2C5    ,
N8    ,8
      ,9          ,X      ,17003,2009,1,Nobody                        ,         ,        ,Nowhere  ,KS,66002,50123459,A1B2C6    ,
";

const ACFTREF: &str = "\
CODE,MFR,MODEL,YEAR,
X,Cessna                        ,172                 ,1998,
Y,Piper                         ,PA-28               ,,
";

fn build_archive(members: &[(&str, &str)]) -> Vec<u8> {
    let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
    for (name, content) in members {
        zip.start_file::<_, ()>(*name, FileOptions::default())
            .unwrap();
        zip.write_all(content.as_bytes()).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

fn write_sources(dir: &Path) -> (PathBuf, PathBuf) {
    let registration = dir.join("MASTER.txt");
    let reference = dir.join("ACFTREF.txt");
    std::fs::write(&registration, MASTER).unwrap();
    std::fs::write(&reference, ACFTREF).unwrap();
    (registration, reference)
}

fn local_config(dir: &Path, output: &str) -> RunConfig {
    let (registration, reference) = write_sources(dir);
    RunConfig::new(
        SourceMode::Local {
            registration,
            reference,
        },
        dir.join(output),
    )
}

async fn run(config: RunConfig) -> faa2etc::Result<faa2etc::RunSummary> {
    let pipeline = FaaPipeline::new(LocalStorage::default(), config);
    EtlEngine::new(pipeline).run().await
}

#[tokio::test]
async fn test_end_to_end_local_files() {
    let temp_dir = TempDir::new().unwrap();
    let config = local_config(temp_dir.path(), "faa.txt");

    let summary = run(config).await.unwrap();

    let output = std::fs::read_to_string(temp_dir.path().join("faa.txt")).unwrap();
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(
        lines,
        vec![
            "tail_number|make|model|year|owner_name|city|state|mode_s_hex|registrant_type",
            "N12345|Cessna|172|1998|Jane Doe|Austin|TX|A1B2C3|Government",
            "N6|Cessna|172|1998|Acme Flying Club|Dallas|TX|A1B2C4|Unknown",
            "N777|||1977|Boeing Co|Seattle|WA|A1B2C5|Corporation",
        ]
    );

    let stats = summary.stats;
    assert_eq!(stats.registration_rows, 5);
    assert_eq!(stats.malformed_registration_rows, 2);
    assert_eq!(stats.unresolved_references, 1);
    assert_eq!(stats.unmapped_registrant_types, 1);
    assert_eq!(stats.rows_emitted, 3);
    assert_eq!(summary.unresolved_policy, UnresolvedPolicy::Blank);
}

#[tokio::test]
async fn test_drop_policy_removes_unresolved_rows() {
    let temp_dir = TempDir::new().unwrap();
    let config =
        local_config(temp_dir.path(), "faa.txt").with_unresolved_policy(UnresolvedPolicy::Drop);

    let summary = run(config).await.unwrap();

    let output = std::fs::read_to_string(temp_dir.path().join("faa.txt")).unwrap();
    assert_eq!(output.lines().count(), 3);
    assert!(!output.contains("N777"));
    assert_eq!(summary.stats.dropped_rows, 1);
    assert_eq!(
        summary.stats.rows_emitted,
        summary.stats.registration_rows - summary.stats.skipped_rows()
    );
}

#[tokio::test]
async fn test_output_is_idempotent() {
    let temp_dir = TempDir::new().unwrap();

    run(local_config(temp_dir.path(), "first.txt")).await.unwrap();
    run(local_config(temp_dir.path(), "second.txt")).await.unwrap();

    let first = std::fs::read(temp_dir.path().join("first.txt")).unwrap();
    let second = std::fs::read(temp_dir.path().join("second.txt")).unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_existing_output_is_overwritten() {
    let temp_dir = TempDir::new().unwrap();
    let output_path = temp_dir.path().join("faa.txt");
    std::fs::write(&output_path, "stale content that is longer than nothing\n".repeat(100)).unwrap();

    run(local_config(temp_dir.path(), "faa.txt")).await.unwrap();

    let output = std::fs::read_to_string(&output_path).unwrap();
    assert!(!output.contains("stale"));
    assert!(output.starts_with("tail_number|"));
}

#[tokio::test]
async fn test_end_to_end_download() {
    let temp_dir = TempDir::new().unwrap();
    let archive = build_archive(&[("ACFTREF.txt", ACFTREF), ("MASTER.txt", MASTER)]);

    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/database/ReleasableAircraft.zip");
            then.status(200)
                .header("Content-Type", "application/zip")
                .body(archive);
        })
        .await;

    let config = RunConfig::new(
        SourceMode::Download {
            url: server.url("/database/ReleasableAircraft.zip"),
        },
        temp_dir.path().join("faa.txt"),
    );
    let summary = run(config).await.unwrap();

    mock.assert_async().await;
    assert_eq!(summary.stats.rows_emitted, 3);

    let downloaded = std::fs::read(temp_dir.path().join("faa.txt")).unwrap();
    let local_dir = TempDir::new().unwrap();
    run(local_config(local_dir.path(), "faa.txt")).await.unwrap();
    let local = std::fs::read(local_dir.path().join("faa.txt")).unwrap();
    assert_eq!(downloaded, local);
}

#[tokio::test]
async fn test_download_failure_writes_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/db.zip");
            then.status(503);
        })
        .await;

    let output_path = temp_dir.path().join("faa.txt");
    let config = RunConfig::new(
        SourceMode::Download {
            url: server.url("/db.zip"),
        },
        &output_path,
    );
    let err = run(config).await.unwrap_err();

    mock.assert_async().await;
    assert!(matches!(err, EtlError::FetchStatusError { status: 503, .. }));
    assert_eq!(err.category().stage(), "fetch");
    assert_ne!(err.exit_code(), 0);
    assert!(!output_path.exists());
}

#[tokio::test]
async fn test_archive_without_reference_file() {
    let temp_dir = TempDir::new().unwrap();
    let archive = build_archive(&[("MASTER.txt", MASTER)]);

    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/db.zip");
            then.status(200).body(archive);
        })
        .await;

    let output_path = temp_dir.path().join("faa.txt");
    let config = RunConfig::new(
        SourceMode::Download {
            url: server.url("/db.zip"),
        },
        &output_path,
    );
    let err = run(config).await.unwrap_err();

    assert!(matches!(err, EtlError::ArchiveError { .. }));
    assert_eq!(err.category().stage(), "extract");
    assert!(!output_path.exists());
}

#[tokio::test]
async fn test_missing_local_file() {
    let temp_dir = TempDir::new().unwrap();
    let config = RunConfig::new(
        SourceMode::Local {
            registration: temp_dir.path().join("MASTER.txt"),
            reference: temp_dir.path().join("ACFTREF.txt"),
        },
        temp_dir.path().join("faa.txt"),
    );

    let err = run(config).await.unwrap_err();
    assert!(matches!(err, EtlError::FileAccessError { .. }));
    assert!(err.to_string().contains("MASTER.txt"));
    assert_eq!(err.category().stage(), "extract");
}

#[tokio::test]
async fn test_unwritable_output() {
    let temp_dir = TempDir::new().unwrap();
    let (registration, reference) = write_sources(temp_dir.path());
    let config = RunConfig::new(
        SourceMode::Local {
            registration,
            reference,
        },
        temp_dir.path().join("missing-dir").join("faa.txt"),
    );

    let err = run(config).await.unwrap_err();
    assert!(matches!(err, EtlError::FileAccessError { .. }));
    assert_eq!(err.category().stage(), "write");
}

#[tokio::test]
async fn test_summary_written_as_json() {
    let temp_dir = TempDir::new().unwrap();
    let summary = run(local_config(temp_dir.path(), "faa.txt")).await.unwrap();

    let summary_path = temp_dir.path().join("summary.json");
    save_summary(&LocalStorage::default(), &summary, &summary_path)
        .await
        .unwrap();

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&summary_path).unwrap()).unwrap();
    assert_eq!(json["stats"]["rows_emitted"], 3);
    assert_eq!(json["unresolved_policy"], "blank");
    assert_eq!(json["stats"]["samples"][0]["kind"], "unmapped_registrant_type");
    assert_eq!(json["stats"]["samples"][1]["code"], "NOPE");
    assert_eq!(json["stats"]["samples"][2]["kind"], "malformed_registration");
}
