use clap::{Parser, Subcommand};
use reqwest::blocking::{multipart, Client};
use serde::Deserialize;
use serde_json::json;
use std::error::Error;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

type CliResult<T> = Result<T, Box<dyn Error>>;

const SAMPLE_CONTENT: &str = "This is a test file for the Stash upload demo.";

#[derive(Parser)]
#[command(name = "stash")]
#[command(about = "Stash upload service demo client")]
struct Cli {
    /// API base URL
    #[arg(long, global = true, default_value = "http://localhost:8080/api")]
    base_url: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload a file
    Upload {
        /// File to upload
        path: PathBuf,
    },
    /// Download a stored file
    Download {
        /// Stored name returned by upload
        stored_name: String,
        /// Destination file
        dest: PathBuf,
    },
    /// Run the end-to-end demo (upload, download, JSON and form submission)
    Demo,
}

#[derive(Debug, Deserialize)]
struct UploadRes {
    stored_name: String,
}

struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    fn new(base_url: &str) -> CliResult<Self> {
        Ok(Self {
            http: Client::builder().timeout(Duration::from_secs(20)).build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn upload(&self, path: &Path) -> CliResult<String> {
        let form = multipart::Form::new().file("file", path)?;
        let response = self
            .http
            .post(self.url("/files/upload"))
            .multipart(form)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("upload failed ({}): {}", status, response.text()?).into());
        }

        Ok(response.json::<UploadRes>()?.stored_name)
    }

    fn download(&self, stored_name: &str, dest: &Path) -> CliResult<u64> {
        let mut response = self
            .http
            .get(self.url(&format!("/files/download/{}", stored_name)))
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("download failed ({}): {}", status, response.text()?).into());
        }

        let mut file = fs::File::create(dest)?;
        let size = io::copy(&mut response, &mut file)?;
        file.flush()?;
        Ok(size)
    }

    fn submit_json(&self, data: &serde_json::Value) -> CliResult<(u16, String)> {
        let response = self
            .http
            .post(self.url("/data/submitJson"))
            .timeout(Duration::from_secs(5))
            .json(data)
            .send()?;
        Ok((response.status().as_u16(), response.text()?))
    }

    fn submit_form(&self, fields: &[(&str, &str)]) -> CliResult<(u16, String)> {
        let response = self
            .http
            .post(self.url("/data/submitForm"))
            .timeout(Duration::from_secs(5))
            .form(fields)
            .send()?;
        Ok((response.status().as_u16(), response.text()?))
    }
}

fn run_demo(client: &ApiClient) -> CliResult<()> {
    println!("--- File Upload Demo ---");
    let mut sample = tempfile::Builder::new()
        .prefix("sample")
        .suffix(".txt")
        .tempfile()?;
    sample.write_all(SAMPLE_CONTENT.as_bytes())?;
    sample.flush()?;
    println!("Created temporary file: {}", sample.path().display());

    let stored_name = client.upload(sample.path())?;
    println!("Uploaded as: {}", stored_name);

    println!("--- File Download Demo ---");
    let downloaded = tempfile::Builder::new()
        .prefix("downloaded_")
        .tempfile()?;
    let size = client.download(&stored_name, downloaded.path())?;
    println!("Downloaded {} bytes to {}", size, downloaded.path().display());

    let content = fs::read(downloaded.path())?;
    if content == SAMPLE_CONTENT.as_bytes() {
        println!("Download matches the uploaded file.");
    } else {
        return Err(format!(
            "download mismatch: expected {} bytes, got {}",
            SAMPLE_CONTENT.len(),
            content.len()
        )
        .into());
    }

    println!("--- JSON Data Submission Demo ---");
    let data = json!({ "name": "Test User", "value": 123, "active": true });
    let (status, body) = client.submit_json(&data)?;
    println!("JSON response {}: {}", status, body);

    println!("--- Form Data Submission Demo ---");
    let (status, body) = client.submit_form(&[
        ("username", "johndoe"),
        ("email", "johndoe@example.com"),
        ("id", "789"),
    ])?;
    println!("Form response {}: {}", status, body);

    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = ApiClient::new(&cli.base_url)?;

    match cli.command {
        Some(Commands::Upload { path }) => match client.upload(&path) {
            Ok(name) => println!("Uploaded {} as: {}", path.display(), name),
            Err(e) => eprintln!("Error uploading file: {}", e),
        },
        Some(Commands::Download { stored_name, dest }) => {
            match client.download(&stored_name, &dest) {
                Ok(size) => println!("Downloaded {} bytes to {}", size, dest.display()),
                Err(e) => eprintln!("Error downloading file: {}", e),
            }
        }
        Some(Commands::Demo) => {
            if let Err(e) = run_demo(&client) {
                eprintln!("Demo failed: {}", e);
            }
        }
        None => {
            println!("Use 'stash --help' for commands");
        }
    }

    Ok(())
}
