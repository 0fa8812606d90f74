//! Integration tests for writing container files and their sibling assets.

use std::sync::Arc;

use anlib::container::{write_library_file, ExportConfig, FileSink, ILibrary, ISymbolKind};
use anlib::model::*;
use anlib::util::{Error, IRect, Rect};
use futures::executor::block_on;
use image::RgbaImage;
use tempfile::TempDir;
use tracing_subscriber::EnvFilter;

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn sample_library() -> (Library, Atlas) {
    let mut atlas = RgbaImage::new(8, 4);
    for (x, y, px) in atlas.enumerate_pixels_mut() {
        *px = image::Rgba([(x * 30) as u8, (y * 60) as u8, 200, 255]);
    }
    let atlas = Arc::new(atlas);

    let mut lib = Library::new(41);
    lib.add_symbol(Symbol::new(
        1,
        Some("star"),
        SymbolKind::Shape(ShapeSymbol {
            texture: TextureRef::new(Arc::clone(&atlas), IRect::new(0, 0, 8, 4), Rect::new(0.0, 0.0, 8.0, 4.0), 1.0),
            bounds: Rect::new(-4.0, -2.0, 8.0, 4.0),
            path: Some(VectorPath { commands: vec![0, 1, 1], data: vec![0.0, 0.0, 8.0, 0.0, 8.0, 4.0] }),
        }),
    ));
    lib.add_symbol(Symbol::new(2, Some("pop"), SymbolKind::Sound(SoundSymbol { data: Some(b"ID3fake".to_vec()) })));

    let mut st = SubTimeline::new(100);
    st.add_action(0, Action::PlaySound { sound_id: 2 });
    st.timelines.push(Timeline::new(vec![Frame::new(0, 0).with_name("star")]));
    let clip = MovieClipSymbol::new(vec![UidInfo::new(1)], vec![NamedState::new("main", Arc::new(st), 0)]);
    lib.add_symbol(Symbol::new(3, Some("scene"), SymbolKind::MovieClip(clip)));

    (lib, atlas)
}

#[test]
fn test_write_file_and_sibling_assets() {
    init_logging();
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("scene.ani");
    let (lib, atlas) = sample_library();

    block_on(write_library_file(&lib, &path, &ExportConfig::default())).expect("Failed to write library");

    let sink = FileSink::new(&path);
    let atlas_path = sink.atlas_path(0);
    let sound_path = sink.sound_path(0);
    assert_eq!(atlas_path.file_name().and_then(|n| n.to_str()), Some("scene.ani.0.png"));
    assert_eq!(sound_path.file_name().and_then(|n| n.to_str()), Some("scene.ani.0.mp3"));

    let png = image::open(&atlas_path).expect("Failed to open atlas").to_rgba8();
    assert_eq!(png, *atlas);
    assert_eq!(std::fs::read(&sound_path).expect("Failed to read sound"), b"ID3fake");

    let decoded = ILibrary::open(&path).expect("Failed to open library");
    println!("strings: {:?}", decoded.strings);
    assert_eq!(decoded.atlas_count, 1);
    assert_eq!(decoded.sound_count, 1);
    assert_eq!(decoded.symbols.len(), 3);

    let ISymbolKind::Shape(shape) = &decoded.symbols[0].kind else {
        panic!("expected shape");
    };
    assert!(shape.path.is_none(), "paths are dropped by default");

    let ISymbolKind::MovieClip(clip) = &decoded.symbol(3).expect("scene symbol").kind else {
        panic!("expected movie clip");
    };
    assert_eq!(clip.sub_timelines[0].actions[&0][0], Action::PlaySound { sound_id: 2 });
    assert_eq!(clip.sub_timelines[0].timelines[0].frames[0].name.as_deref(), Some("star"));
}

#[test]
fn test_keep_paths_file() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("paths.ani");
    let (lib, _) = sample_library();

    let config = ExportConfig::default().with_keep_paths(true).with_compression(0.0);
    block_on(write_library_file(&lib, &path, &config)).expect("Failed to write library");

    let decoded = ILibrary::open(&path).expect("Failed to open library");
    let ISymbolKind::Shape(shape) = &decoded.symbols[0].kind else {
        panic!("expected shape");
    };
    let path = shape.path.as_ref().expect("path kept");
    assert_eq!(path.commands, vec![0, 1, 1]);
    assert_eq!(path.data, vec![0.0, 0.0, 8.0, 0.0, 8.0, 4.0]);
}

#[test]
fn test_open_missing_and_short_files() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    assert!(matches!(ILibrary::open(dir.path().join("missing.ani")), Err(Error::Io(_))));

    let short = dir.path().join("short.ani");
    std::fs::write(&short, b"ANL").expect("Failed to write file");
    assert!(matches!(ILibrary::open(&short), Err(Error::UnexpectedEof(3))));
}

#[test]
fn test_failed_asset_write_leaves_no_container() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    // Assets land next to a container inside a directory that does not exist.
    let path = dir.path().join("nowhere").join("scene.ani");
    let (lib, _) = sample_library();

    let err = block_on(write_library_file(&lib, &path, &ExportConfig::default())).unwrap_err();
    assert!(matches!(err, Error::AssetWrite { .. }));
    assert!(!path.exists());
}
