// build.rs
fn main() {
    // Embed build timestamp and compiler version for the system section
    vergen::EmitBuilder::builder()
        .all_build()
        .all_rustc()
        .emit()
        .expect("Unable to generate build info");
}
