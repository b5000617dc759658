/// SQL keywords, punctuation and operators.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Token {
    // Keywords
    SELECT,
    DISTINCT,
    FROM,
    WHERE,
    AND,
    OR,
    NOT,
    AS,
    ON,
    JOIN,
    INNER,
    LEFT,
    GROUP,
    ORDER,
    BY,
    HAVING,
    LIMIT,
    OFFSET,
    ASC,
    DESC,
    IS,
    NULL,
    IN,
    LIKE,
    ESCAPE,
    BETWEEN,
    INSERT,
    INTO,
    VALUES,

    // Punctuation
    LPAREN,
    RPAREN,
    COMMA,
    DOT,
    SEMI,

    // Operators
    EQ,
    NE,
    LT,
    GT,
    LE,
    GE,
    PLUS,
    MINUS,
    STAR,
    SLASH,
}

impl Token {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Token::SELECT => "SELECT",
            Token::DISTINCT => "DISTINCT",
            Token::FROM => "FROM",
            Token::WHERE => "WHERE",
            Token::AND => "AND",
            Token::OR => "OR",
            Token::NOT => "NOT",
            Token::AS => "AS",
            Token::ON => "ON",
            Token::JOIN => "JOIN",
            Token::INNER => "INNER",
            Token::LEFT => "LEFT",
            Token::GROUP => "GROUP",
            Token::ORDER => "ORDER",
            Token::BY => "BY",
            Token::HAVING => "HAVING",
            Token::LIMIT => "LIMIT",
            Token::OFFSET => "OFFSET",
            Token::ASC => "ASC",
            Token::DESC => "DESC",
            Token::IS => "IS",
            Token::NULL => "NULL",
            Token::IN => "IN",
            Token::LIKE => "LIKE",
            Token::ESCAPE => "ESCAPE",
            Token::BETWEEN => "BETWEEN",
            Token::INSERT => "INSERT",
            Token::INTO => "INTO",
            Token::VALUES => "VALUES",
            Token::LPAREN => "(",
            Token::RPAREN => ")",
            Token::COMMA => ",",
            Token::DOT => ".",
            Token::SEMI => ";",
            Token::EQ => "=",
            Token::NE => "<>",
            Token::LT => "<",
            Token::GT => ">",
            Token::LE => "<=",
            Token::GE => ">=",
            Token::PLUS => "+",
            Token::MINUS => "-",
            Token::STAR => "*",
            Token::SLASH => "/",
        }
    }

    /// Comparison and arithmetic operators, rendered with surrounding spaces.
    pub const fn is_operator(&self) -> bool {
        matches!(
            self,
            Token::EQ
                | Token::NE
                | Token::LT
                | Token::GT
                | Token::LE
                | Token::GE
                | Token::PLUS
                | Token::MINUS
                | Token::STAR
                | Token::SLASH
        )
    }
}

impl core::fmt::Display for Token {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
