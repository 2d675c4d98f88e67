use assert_cmd::prelude::*;
use predicates::prelude::*;
use predicates::str::contains;
use std::fs;
use std::io::Write;
use std::process::Command;
use tempfile::{tempdir, NamedTempFile};

fn write_frame() -> NamedTempFile {
    let frame = r#"<frame>
  <target><width>1280</width><height>720</height></target>
  <rig>mono</rig>
  <device><position>0 1.5 0</position></device>
  <light>
    <position>0 3 -1</position>
    <color>255 255 255</color>
  </light>
</frame>
"#;
    let mut tmp = NamedTempFile::new().expect("temp frame");
    tmp.write_all(frame.as_bytes()).expect("write frame");
    tmp
}

#[test]
fn header_declares_every_layout() {
    let mut cmd = Command::cargo_bin("xr-uniforms").expect("binary exists");
    cmd.arg("header");
    cmd.assert()
        .success()
        .stdout(contains("#import <simd/simd.h>"))
        .stdout(contains("struct FrameUniforms {"))
        .stdout(contains("    simd_float4x4 cameraTransformL;"))
        .stdout(contains("struct VolumeSpotLight {"))
        .stdout(contains("struct MaskedVertex {"));
}

#[test]
fn header_can_be_restricted() {
    let mut cmd = Command::cargo_bin("xr-uniforms").expect("binary exists");
    cmd.arg("header").arg("fragment");
    cmd.assert()
        .success()
        .stdout(contains("struct FragmentUniforms {"))
        .stdout(contains("FrameUniforms").not());
}

#[test]
fn unknown_variant_fails() {
    let mut cmd = Command::cargo_bin("xr-uniforms").expect("binary exists");
    cmd.arg("header").arg("bogus");
    cmd.assert()
        .failure()
        .stderr(contains("unknown layout variant `bogus`"));
}

#[test]
fn layout_lists_sizes_and_offsets() {
    let mut cmd = Command::cargo_bin("xr-uniforms").expect("binary exists");
    cmd.arg("layout");
    cmd.assert()
        .success()
        .stdout(contains("FrameUniforms (frame) size=448 align=16"))
        .stdout(contains("FragmentUniforms (fragment) size=8 align=8"))
        .stdout(contains("VolumeSpotLight (volume-spot-light) size=272 align=16"))
        .stdout(contains("   240  simd_float3 color"));
}

#[test]
fn pack_prints_summary_and_writes_blocks() {
    let frame = write_frame();
    let out = tempdir().expect("temp dir");
    let mut cmd = Command::cargo_bin("xr-uniforms").expect("binary exists");
    cmd.arg("pack").arg(frame.path()).arg("--out").arg(out.path());
    cmd.assert()
        .success()
        .stdout(contains("Packed frame with 1 view(s) and 1 light(s)"))
        .stdout(contains(" - model-view: 800 bytes"))
        .stdout(contains(" - fragment: 8 bytes"))
        .stdout(contains(" - light 0 in view 0 at (0.00, 1.50, -1.00)"));

    let fragment = fs::read(out.path().join("fragment.bin")).expect("fragment block");
    assert_eq!(fragment.len(), 8);
    assert_eq!(&fragment[..4], &1280i32.to_ne_bytes());
    assert_eq!(&fragment[4..], &720i32.to_ne_bytes());
    let lights = fs::read(out.path().join("volume-spot-light.bin")).expect("light block");
    assert_eq!(lights.len(), 272);
}

#[test]
fn pack_reports_missing_file() {
    let mut cmd = Command::cargo_bin("xr-uniforms").expect("binary exists");
    cmd.arg("pack").arg("does-not-exist.xml");
    cmd.assert()
        .failure()
        .stderr(contains("failed to read frame description"));
}
