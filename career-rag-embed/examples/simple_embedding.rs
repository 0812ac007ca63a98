//! Embed a few career descriptions and print how close they are to a query.

use career_rag_embed::{EmbedConfig, EmbeddingProvider, FastEmbedProvider};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let cache_dir = tempfile::tempdir()?;
    let config = EmbedConfig::default()
        .with_cache_dir(cache_dir.path())
        .with_batch_size(2)
        .with_download_progress(true);

    println!("Model: {}  batch size: {}", config.model_name, config.batch_size);
    let provider = FastEmbedProvider::create(config).await?;
    println!(
        "{} provider ready, dimension {}",
        provider.provider_name(),
        provider.embedding_dimension()
    );

    let careers = vec![
        "Civil engineers plan and supervise construction projects.".to_string(),
        "Graphic designers create visual concepts for brands.".to_string(),
        "Nurses care for patients in hospitals and clinics.".to_string(),
    ];
    let result = provider.embed_texts(&careers).await?;

    let query = provider
        .embed_text("Which careers suit a creative, artistic person?")
        .await?;

    for (career, embedding) in careers.iter().zip(result.embeddings.iter()) {
        let similarity: f32 = query
            .iter()
            .zip(embedding.iter())
            .map(|(a, b)| a.to_f32() * b.to_f32())
            .sum();
        println!("{similarity:.3}  {career}");
    }

    Ok(())
}
