//! Fixed pt-BR strings shown to the reader.

pub const FEED_LOAD_FAILED: &str =
    "Não foi possível carregar as notícias. Tente novamente mais tarde.";
pub const NO_PUBLISHED_NEWS: &str = "Nenhuma notícia publicada no momento.";
pub const NO_MATCHES: &str = "Nenhuma notícia encontrada.";
pub const LOADING: &str = "Carregando notícias...";

pub const SHOW_MORE: &str = "Mostrar mais";
pub const SHOW_LESS: &str = "Mostrar menos";
pub const BACK_TO_TOP: &str = "Voltar ao topo";
pub const INSTAGRAM_LABEL: &str = "Ver esta notícia no Instagram";
pub const SEARCH_PLACEHOLDER: &str = "Buscar notícias...";

pub const THEME_CHANGED_DARK: &str = "Tema alterado para escuro.";
pub const THEME_CHANGED_LIGHT: &str = "Tema alterado para claro.";
pub const SWITCH_TO_DARK: &str = "Ativar tema escuro";
pub const SWITCH_TO_LIGHT: &str = "Ativar tema claro";
